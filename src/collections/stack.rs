#[cfg(feature = "no-std")]
use alloc::vec::Vec;

use core::fmt;

/// a LIFO stack over a growable array. no sharing or copy-on-write here;
/// cloning a stack copies its elements.
#[derive(Clone, PartialEq, Eq)]
pub struct Stack<T> {
    storage: Vec<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
        }
    }

    /// get the number of elements on the stack
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// returns true if the stack holds no elements
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// place a value on top of the stack. O(1) amortized.
    pub fn push(&mut self, value: T) {
        self.storage.push(value);
    }

    /// remove and return the top value, or None if the stack is empty. O(1).
    pub fn pop(&mut self) -> Option<T> {
        self.storage.pop()
    }

    /// return the top value without removing it, or None if the stack is
    /// empty. O(1).
    pub fn peek(&self) -> Option<&T> {
        self.storage.last()
    }

    /// return an iterator over the elements from top to bottom
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.storage.iter().rev()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// elements newline-joined from top to bottom; an empty stack renders as
/// the empty string
impl<T: fmt::Display> fmt::Display for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stack_is_empty() {
        let stack = Stack::<u32>::new();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn pop_on_empty_stack_returns_none() {
        let mut stack = Stack::<u32>::new();
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn peek_on_empty_stack_returns_none() {
        let stack = Stack::<u32>::new();
        assert_eq!(stack.peek(), None);
    }

    #[test]
    fn push_places_the_value_on_top() {
        let mut stack = Stack::new();
        stack.push(73);
        assert_eq!(stack.peek(), Some(&73));
        stack.push(42);
        assert_eq!(stack.peek(), Some(&42));
    }

    #[test]
    fn pop_returns_values_in_reverse_push_order() {
        let mut stack = Stack::new();
        for i in [1, 2, 3] {
            stack.push(i);
        }
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn peek_does_not_remove_the_top() {
        let mut stack = Stack::new();
        stack.push(73);
        assert_eq!(stack.peek(), Some(&73));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some(&73));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn is_empty_is_only_true_when_no_elements() {
        let mut stack = Stack::new();
        assert!(stack.is_empty());
        stack.push(73);
        assert!(!stack.is_empty());
        assert_eq!(stack.pop(), Some(73));
        assert!(stack.is_empty());
    }

    #[test]
    fn iter_walks_top_to_bottom() {
        let mut stack = Stack::new();
        for i in [1, 2, 3] {
            stack.push(i);
        }
        let values: Vec<u32> = stack.iter().copied().collect();
        assert_eq!(values, [3, 2, 1]);
    }

    #[test]
    fn display_joins_elements_top_to_bottom_with_newlines() {
        let mut stack = Stack::new();
        for i in [1, 2, 3] {
            stack.push(i);
        }
        assert_eq!(format!("{}", stack), "3\n2\n1");
    }

    #[test]
    fn display_of_an_empty_stack_is_the_empty_string() {
        let stack = Stack::<u32>::new();
        assert_eq!(format!("{}", stack), "");
    }
}
