use std::fmt;
use std::ops::{Deref, DerefMut};


// Exclusive view of a value that runs a cleanup action when it goes out of scope. Used to revert
// speculative board changes no matter how the scope is left.
pub struct Janitor<'a, T, F>
where
    F: FnOnce(&mut T),
{
    value: &'a mut T,
    on_scope_end: Option<F>,
}

impl<'a, T, F> Janitor<'a, T, F>
where
    F: FnOnce(&mut T),
{
    pub fn new(value: &'a mut T, on_scope_end: F) -> Self {
        Self { value, on_scope_end: Some(on_scope_end) }
    }
}

impl<T, F> fmt::Debug for Janitor<'_, T, F>
where
    T: fmt::Debug,
    F: FnOnce(&mut T),
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Janitor").field(&self.value).finish()
    }
}

impl<T, F> Deref for Janitor<'_, T, F>
where
    F: FnOnce(&mut T),
{
    type Target = T;

    fn deref(&self) -> &T { self.value }
}

impl<T, F> DerefMut for Janitor<'_, T, F>
where
    F: FnOnce(&mut T),
{
    fn deref_mut(&mut self) -> &mut T { self.value }
}

impl<T, F> Drop for Janitor<'_, T, F>
where
    F: FnOnce(&mut T),
{
    fn drop(&mut self) {
        if let Some(on_scope_end) = self.on_scope_end.take() {
            on_scope_end(self.value);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_runs_on_scope_end() {
        let mut v = vec![1, 2];
        {
            let mut guard = Janitor::new(&mut v, |v| {
                v.pop();
            });
            guard.push(3);
            assert_eq!(*guard, vec![1, 2, 3]);
        }
        assert_eq!(v, vec![1, 2]);
    }
}
