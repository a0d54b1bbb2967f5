/// A finite lazy sequence driven by a pull closure.
///
/// The generator starts suspended: nothing is computed until the consumer
/// asks for a value, either through [`Iterator::next`] or the manual
/// [`advance`](Generator::advance)/[`value`](Generator::value) pair. Once
/// the closure reports the end it is never called again, and dropping the
/// generator drops whatever state the closure captured.
pub struct Generator<T> {
    pull: Box<dyn FnMut() -> Option<T>>,
    current: Option<T>,
    finished: bool,
}

impl<T> Generator<T> {
    pub fn new<F>(pull: F) -> Generator<T>
    where
        F: FnMut() -> Option<T> + 'static,
    {
        Generator {
            pull: Box::new(pull),
            current: None,
            finished: false,
        }
    }

    /// Produces the next value, keeping it readable through
    /// [`value`](Generator::value). Returns false once exhausted.
    pub fn advance(&mut self) -> bool {
        if self.finished {
            self.current = None;
            return false;
        }
        self.current = (self.pull)();
        if self.current.is_none() {
            self.finished = true;
        }
        self.current.is_some()
    }

    /// The value produced by the last [`advance`](Generator::advance).
    pub fn value(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// True until the sequence has reported its end.
    pub fn is_active(&self) -> bool {
        !self.finished
    }
}

impl<T> Iterator for Generator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        // Hand over a value a manual advance() already pulled.
        if let Some(value) = self.current.take() {
            return Some(value);
        }
        if self.finished {
            return None;
        }
        match (self.pull)() {
            Some(value) => Some(value),
            None => {
                self.finished = true;
                None
            }
        }
    }
}
