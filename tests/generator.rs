use coriolis::tools::Generator;

fn fibonacci(count: usize) -> Generator<u64> {
    let mut remaining = count;
    let (mut a, mut b) = (0u64, 1u64);
    Generator::new(move || {
        if remaining == 0 {
            return None;
        }
        remaining -= 1;

        let value = a;
        let next = a + b;
        a = b;
        b = next;
        Some(value)
    })
}

#[test]
fn first_eight_fibonacci_numbers() {
    let values: Vec<u64> = fibonacci(8).collect();
    assert_eq!(values, vec![0, 1, 1, 2, 3, 5, 8, 13]);
}

#[test]
fn iteration_terminates_and_fuses() {
    let mut generator = fibonacci(3);
    assert_eq!(generator.next(), Some(0));
    assert_eq!(generator.next(), Some(1));
    assert_eq!(generator.next(), Some(1));
    assert_eq!(generator.next(), None);
    // Exhausted stays exhausted.
    assert_eq!(generator.next(), None);
    assert!(!generator.is_active());
}

#[test]
fn manual_advance_and_value() {
    let mut generator = fibonacci(2);
    assert!(generator.is_active());
    assert_eq!(generator.value(), None);

    assert!(generator.advance());
    assert_eq!(generator.value(), Some(&0));

    assert!(generator.advance());
    assert_eq!(generator.value(), Some(&1));

    assert!(!generator.advance());
    assert_eq!(generator.value(), None);
    assert!(!generator.is_active());
}

#[test]
fn captured_state_is_dropped_with_the_generator() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Probe(Arc<AtomicBool>);
    impl Drop for Probe {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicBool::new(false));
    let probe = Probe(dropped.clone());

    let mut generator = Generator::new(move || {
        let _keep_alive = &probe;
        Some(1)
    });
    assert_eq!(generator.next(), Some(1));

    drop(generator);
    assert!(dropped.load(Ordering::SeqCst));
}
