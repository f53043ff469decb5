use lisp_eval::{Runtime, Value};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn int_list_source(items: &[i64]) -> String {
    let body: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    format!("'({})", body.join(" "))
}

fn eval(runtime: &Runtime, source: &str) -> Value {
    match runtime.evaluate(source) {
        Ok(value) => value,
        Err(err) => panic!("{} failed: {}", source, err),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn car_and_cdr_undo_cons(
        head in -1000i64..1000,
        tail in prop::collection::vec(any::<i64>(), 0..8),
    ) {
        let rt = Runtime::new();
        let list = int_list_source(&tail);
        let car = eval(&rt, &format!("(car (cons {} {}))", head, list));
        let cdr = eval(&rt, &format!("(cdr (cons {} {}))", head, list));
        prop_assert_eq!(car, Value::Integer(head));
        prop_assert_eq!(cdr, Value::list(tail.into_iter().map(Value::Integer).collect()));
    }

    #[test]
    fn reverse_twice_is_identity(items in prop::collection::vec(any::<i64>(), 0..12)) {
        let rt = Runtime::new();
        let list = int_list_source(&items);
        for kind in ["list", "vector"] {
            let source = format!("(reverse '{kind} (reverse '{kind} {list}))");
            let twice = eval(&rt, &source);
            let expected: Vec<Value> = items.iter().copied().map(Value::Integer).collect();
            match twice {
                Value::Vector(values) => prop_assert_eq!(values, expected),
                other => prop_assert_eq!(other, Value::list(expected)),
            }
        }
    }

    #[test]
    fn builders_never_change_their_inputs(
        items in prop::collection::vec(-50i64..50, 1..10),
        extra in -50i64..50,
    ) {
        let rt = Runtime::new();
        eval(&rt, &format!("(set 'xs {})", int_list_source(&items)));
        let before = eval(&rt, "xs").to_string();
        for source in [
            format!("(append 'list xs {})", extra),
            format!("(insert-index 'list xs 0 {})", extra),
            "(concat 'list xs xs)".to_string(),
            "(reverse 'list xs)".to_string(),
            "(slice 'list xs 0 1)".to_string(),
            format!("(cons {} xs)", extra),
        ] {
            eval(&rt, &source);
            prop_assert_eq!(eval(&rt, "xs").to_string(), before.clone(), "after {}", source);
        }
    }

    #[test]
    fn make_sequence_matches_range(start in -20i64..20, len in 0i64..30, step in 1i64..5) {
        let rt = Runtime::new();
        let stop = start + len;
        let value = eval(&rt, &format!("(make-sequence {} {} {})", start, stop, step));
        let expected: Vec<Value> = (start..stop)
            .step_by(step as usize)
            .map(Value::Integer)
            .collect();
        prop_assert_eq!(value, Value::list(expected));
    }
}
