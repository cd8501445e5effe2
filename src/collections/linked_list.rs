#[cfg(feature = "no-std")]
use alloc::rc::Rc;
#[cfg(feature = "no-std")]
use alloc::vec::Vec;
#[cfg(not(feature = "no-std"))]
use std::rc::Rc;

use core::cmp::Ordering;
use core::fmt;

/// an opaque handle to a node in a [`LinkedList`]'s chain
///
/// handles are plain slot indices into the list's node table, so they are
/// `Copy` and carry no ownership. a handle is only meaningful for the list
/// value it was obtained from, and only until that value's next mutation:
/// node-addressed operations remap the handle they are given across the
/// copy-on-write step, but any other handle held across a privatization
/// goes stale (see [`LinkedList::insert_after`] for the full contract).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRef(usize);

/// one element of a chain: a value and the slot of the next node, if any
struct Node<T> {
    value: T,
    next: Option<NodeRef>,
}

enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<usize> },
}

/// a growable node table. chain links are slot indices rather than owning
/// pointers, so the chain can be traversed and spliced without building a
/// self-referential ownership graph. vacated slots are kept on a free list
/// and reused by later allocations.
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
        }
    }

    fn alloc(&mut self, node: Node<T>) -> NodeRef {
        match self.free_head {
            Some(slot) => {
                self.free_head = match self.slots[slot] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => {
                        unreachable!("free list entries are always vacant slots")
                    }
                };
                self.slots[slot] = Slot::Occupied(node);
                NodeRef(slot)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeRef(self.slots.len() - 1)
            }
        }
    }

    /// vacate a slot and return the node that occupied it
    fn free(&mut self, node: NodeRef) -> Node<T> {
        let slot = core::mem::replace(
            &mut self.slots[node.0],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(node.0);
        match slot {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links never reference vacant slots"),
        }
    }

    fn get(&self, node: NodeRef) -> &Node<T> {
        match &self.slots[node.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links never reference vacant slots"),
        }
    }

    fn get_mut(&mut self, node: NodeRef) -> &mut Node<T> {
        match &mut self.slots[node.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("chain links never reference vacant slots"),
        }
    }

    fn try_get(&self, node: NodeRef) -> Option<&Node<T>> {
        match self.slots.get(node.0) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }
}

/// a singly-linked list with value semantics and copy-on-write sharing
///
/// cloning a `LinkedList` copies only the handle: both values reference the
/// same underlying chain until one of them mutates. the first mutation after
/// a sharing event deep-copies the mutator's chain (privatization), so no
/// list value ever observes a mutation performed through another value.
///
/// the chain lives in a node table owned through an `Rc`, which also makes
/// the sharing story single-threaded by construction: a `LinkedList` is
/// neither `Send` nor `Sync`, so aliased chains cannot be mutated from two
/// threads at all.
pub struct LinkedList<T> {
    arena: Rc<Arena<T>>,
    head: Option<NodeRef>,
    tail: Option<NodeRef>,
}

impl<T> LinkedList<T> {
    pub fn new() -> Self {
        Self {
            arena: Rc::new(Arena::new()),
            head: None,
            tail: None,
        }
    }

    /// returns true if the list holds no elements
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// get the number of elements by walking the chain. O(n), the list
    /// stores no separate count.
    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut curr = self.head;
        while let Some(node) = curr {
            len += 1;
            curr = self.arena.get(node).next;
        }
        len
    }

    /// get a handle to the node at position `at`, counting from the head,
    /// or None if `at` is past the end. O(at).
    pub fn node(&self, at: usize) -> Option<NodeRef> {
        let mut curr = self.head;
        let mut position = 0;
        while let Some(node) = curr {
            if position == at {
                return Some(node);
            }
            curr = self.arena.get(node).next;
            position += 1;
        }
        None
    }

    /// read the value behind a node handle, or None if the handle does not
    /// name a live node in this list's table
    pub fn get(&self, node: NodeRef) -> Option<&T> {
        self.arena.try_get(node).map(|node| &node.value)
    }

    /// returns true when this list value is the only owner of its chain,
    /// i.e. no clone is currently sharing the underlying nodes. mutation in
    /// place is safe exactly under this condition.
    pub fn is_uniquely_owned(&self) -> bool {
        Rc::strong_count(&self.arena) == 1
    }

    /// return an iterator over the values from head to tail
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            curr: self.head,
        }
    }

    /// return a cursor positioned at the head (the end cursor if empty)
    pub fn cursor_front(&self) -> Cursor<'_, T> {
        Cursor {
            list: self,
            node: self.head,
        }
    }

    /// return the end cursor, one past the tail
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        Cursor {
            list: self,
            node: None,
        }
    }

    /// return a cursor at position `at`, or the end cursor if `at` is past
    /// the end
    pub fn cursor_at(&self, at: usize) -> Cursor<'_, T> {
        Cursor {
            list: self,
            node: self.node(at),
        }
    }

    /// true when `to` is reachable from `from` by following next links one
    /// or more times
    fn reaches(&self, from: NodeRef, to: NodeRef) -> bool {
        let mut curr = self.arena.get(from).next;
        while let Some(node) = curr {
            if node == to {
                return true;
            }
            curr = self.arena.get(node).next;
        }
        false
    }

    fn arena_mut(&mut self) -> &mut Arena<T> {
        // callers privatize first, so exclusivity is guaranteed here
        Rc::get_mut(&mut self.arena).expect("mutating a chain that is still shared")
    }
}

impl<T: Clone> LinkedList<T> {
    /// the copy-on-write step. if the chain is shared with another list
    /// value, deep-copy it head to end into a fresh table and repoint
    /// head/tail at the copies; the old chain is left untouched for the
    /// other owners. O(1) when already exclusive, O(n) on the first
    /// mutation after a sharing event.
    fn privatize(&mut self) {
        self.privatize_tracking(None);
    }

    /// privatize, remapping `node` to its copy when the chain gets copied.
    /// node-addressed mutations go through this so a handle taken from the
    /// current chain stays valid across the copy-on-write step.
    fn privatize_returning(&mut self, node: NodeRef) -> NodeRef {
        self.privatize_tracking(Some(node)).unwrap_or(node)
    }

    /// copy-on-write with handle tracking: returns `track` itself when no
    /// copy was needed, the copy of `track` when one was made, or None when
    /// `track` was not on the chain (a stale or foreign handle, left to the
    /// caller contract).
    fn privatize_tracking(&mut self, track: Option<NodeRef>) -> Option<NodeRef> {
        if self.is_uniquely_owned() {
            return track;
        }

        let mut fresh = Arena::new();
        let mut new_head = None;
        let mut new_tail: Option<NodeRef> = None;
        let mut tracked = None;
        let mut curr = self.head;
        while let Some(node) = curr {
            let old = self.arena.get(node);
            let copy = fresh.alloc(Node {
                value: old.value.clone(),
                next: None,
            });
            if track == Some(node) {
                tracked = Some(copy);
            }
            match new_tail {
                None => new_head = Some(copy),
                Some(prev) => fresh.get_mut(prev).next = Some(copy),
            }
            new_tail = Some(copy);
            curr = old.next;
        }

        self.arena = Rc::new(fresh);
        self.head = new_head;
        self.tail = new_tail;
        tracked
    }

    /// push a value to the front of the list. the new node becomes the
    /// head, and also the tail if the list was empty. O(1).
    pub fn push(&mut self, value: T) {
        self.privatize();
        let next = self.head;
        let node = self.arena_mut().alloc(Node { value, next });
        self.head = Some(node);
        if self.tail.is_none() {
            self.tail = Some(node);
        }
    }

    /// append a value after the tail of the list. equivalent to push when
    /// the list is empty. O(1).
    pub fn append(&mut self, value: T) {
        self.privatize();
        let tail = match self.tail {
            Some(tail) => tail,
            None => return self.push(value),
        };
        let arena = self.arena_mut();
        let node = arena.alloc(Node { value, next: None });
        arena.get_mut(tail).next = Some(node);
        self.tail = Some(node);
    }

    /// splice a new value in after `node` and return the inserted node's
    /// handle. if `node` was the tail, the inserted node becomes the new
    /// tail. on an empty list this degrades to an append. O(1).
    ///
    /// caller contract: `node` must belong to this list's current chain. a
    /// handle taken from this chain stays valid even when this call
    /// privatizes a shared chain (the copy-on-write step remaps it to the
    /// copied node). a handle from an earlier mutation of this value, or
    /// from a different list value, is a logic error with an unspecified
    /// (but memory-safe) result: the wrong node may be spliced, or the call
    /// may panic on a vacated slot.
    pub fn insert_after(&mut self, value: T, node: NodeRef) -> NodeRef {
        let node = self.privatize_returning(node);
        if self.tail.is_none() {
            self.append(value);
            return self.head.expect("append on an empty list sets the head");
        }
        let tail = self.tail;
        let arena = self.arena_mut();
        let next = arena.get(node).next;
        let inserted = arena.alloc(Node { value, next });
        arena.get_mut(node).next = Some(inserted);
        if tail == Some(node) {
            self.tail = Some(inserted);
        }
        inserted
    }

    /// detach the head and return its value, or None if the list is empty.
    /// O(1).
    pub fn pop(&mut self) -> Option<T> {
        self.privatize();
        let head = self.head?;
        let node = self.arena_mut().free(head);
        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        Some(node.value)
    }

    /// detach the tail and return its value, or None if the list is empty.
    /// walks to the tail's predecessor, so O(n).
    pub fn remove_last(&mut self) -> Option<T> {
        self.privatize();
        let tail = self.tail?;
        if self.head == self.tail {
            return self.pop();
        }

        let mut prev = self.head.expect("non-empty list has a head");
        while self.arena.get(prev).next != Some(tail) {
            prev = self
                .arena
                .get(prev)
                .next
                .expect("tail is reachable from head");
        }

        let arena = self.arena_mut();
        arena.get_mut(prev).next = None;
        let node = arena.free(tail);
        self.tail = Some(prev);
        Some(node.value)
    }

    /// remove the node after `node` and return its value, or None if `node`
    /// has no successor. if the removed node was the tail, `node` becomes
    /// the new tail. O(1).
    ///
    /// same caller contract as [`LinkedList::insert_after`]: `node` must
    /// belong to this list's current chain, and is remapped across the
    /// copy-on-write step when this call privatizes a shared chain.
    pub fn remove_after(&mut self, node: NodeRef) -> Option<T> {
        let node = self.privatize_returning(node);
        let removed = self.arena.get(node).next?;
        let arena = self.arena_mut();
        let removed_node = arena.free(removed);
        arena.get_mut(node).next = removed_node.next;
        if self.tail == Some(removed) {
            self.tail = Some(node);
        }
        Some(removed_node.value)
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// cloning copies the handle only; the chain is shared until either value
/// next mutates
impl<T> Clone for LinkedList<T> {
    fn clone(&self) -> Self {
        Self {
            arena: Rc::clone(&self.arena),
            head: self.head,
            tail: self.tail,
        }
    }
}

impl<T: PartialEq> PartialEq for LinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        let mut ours = self.iter();
        let mut theirs = other.iter();
        loop {
            match (ours.next(), theirs.next()) {
                (Some(a), Some(b)) if a == b => continue,
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> LinkedList<T> {
    /// render a node as its value followed by the remainder of the chain
    fn fmt_node(&self, node: NodeRef, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.arena.get(node);
        write!(f, "{}", node.value)?;
        match node.next {
            None => Ok(()),
            Some(next) => {
                write!(f, " -> ")?;
                self.fmt_node(next, f)
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.head {
            None => write!(f, "Empty list"),
            Some(head) => {
                write!(f, "LinkedList: ")?;
                self.fmt_node(head, f)
            }
        }
    }
}

pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    curr: Option<NodeRef>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.arena.get(self.curr?);
        self.curr = node.next;
        Some(&node.value)
    }
}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// a read-only position over a [`LinkedList`]'s chain
///
/// a cursor either references a node or is the end cursor, one past the
/// tail. cursors order by chain reachability: `a < b` when `b`'s node can
/// be reached from `a`'s by following next links, and the end cursor is
/// greater than every element cursor. cursors over different lists are
/// unordered.
pub struct Cursor<'a, T> {
    list: &'a LinkedList<T>,
    node: Option<NodeRef>,
}

impl<'a, T> Cursor<'a, T> {
    /// the value at this position, or None at the end cursor
    pub fn value(&self) -> Option<&'a T> {
        self.node.map(|node| &self.list.arena.get(node).value)
    }

    /// returns true if this is the end cursor
    pub fn at_end(&self) -> bool {
        self.node.is_none()
    }

    /// return a new cursor one step forward. advancing the end cursor
    /// yields the end cursor again; going past the end is a caller error
    /// this type answers with a no-op.
    pub fn advance(&self) -> Self {
        match self.node {
            None => *self,
            Some(node) => Self {
                list: self.list,
                node: self.list.arena.get(node).next,
            },
        }
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.list, other.list) && self.node == other.node
    }
}

impl<T> PartialOrd for Cursor<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !core::ptr::eq(self.list, other.list) {
            return None;
        }
        match (self.node, other.node) {
            (None, None) => Some(Ordering::Equal),
            (Some(a), Some(b)) if a == b => Some(Ordering::Equal),
            (None, Some(_)) => Some(Ordering::Greater),
            (Some(_), None) => Some(Ordering::Less),
            (Some(a), Some(b)) => {
                if self.list.reaches(a, b) {
                    Some(Ordering::Less)
                } else if self.list.reaches(b, a) {
                    Some(Ordering::Greater)
                } else {
                    None
                }
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("node", &self.node).finish()
    }
}


// proptest doesn't run under miri with default config
#[cfg(all(not(miri), test))]
mod proptests {
    use std::collections::VecDeque;

    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest::test_runner::Config;
    use proptest_derive::Arbitrary;
    use proptest_state_machine::{ReferenceStateMachine, StateMachineTest};
    use rand::Rng;

    use super::*;

    #[derive(Arbitrary, Debug)]
    enum Operation {
        Push(u32),
        Append(u32),
        Pop,
        RemoveLast,
        InsertAfter(u32),
        RemoveAfter,
        Snapshot,
    }

    proptest! {
        // drives the list against a VecDeque reference model. Snapshot
        // clones the list and records its contents; every step re-checks
        // all snapshots, which is the copy-on-write isolation property
        // under random interleaving.
        #[test]
        fn list_matches_reference_and_snapshots_stay_frozen(ops in vec(any::<Operation>(), 1..128)) {
            let mut reference: VecDeque<u32> = VecDeque::new();
            let mut list = LinkedList::new();
            let mut snapshots: Vec<(LinkedList<u32>, Vec<u32>)> = Vec::new();

            for op in ops.iter() {
                match op {
                    Operation::Push(value) => {
                        reference.push_front(*value);
                        list.push(*value);
                    }
                    Operation::Append(value) => {
                        reference.push_back(*value);
                        list.append(*value);
                    }
                    Operation::Pop => {
                        assert_eq!(reference.pop_front(), list.pop());
                    }
                    Operation::RemoveLast => {
                        assert_eq!(reference.pop_back(), list.remove_last());
                    }
                    Operation::InsertAfter(value) => {
                        if !reference.is_empty() {
                            let at = rand::thread_rng().gen_range(0..reference.len());
                            let node = list.node(at).unwrap();
                            list.insert_after(*value, node);
                            reference.insert(at + 1, *value);
                        }
                    }
                    Operation::RemoveAfter => {
                        if !reference.is_empty() {
                            let at = rand::thread_rng().gen_range(0..reference.len());
                            let node = list.node(at).unwrap();
                            assert_eq!(reference.remove(at + 1), list.remove_after(node));
                        }
                    }
                    Operation::Snapshot => {
                        snapshots.push((list.clone(), list.iter().copied().collect()));
                    }
                }

                assert_eq!(reference.len(), list.len());
                for (expected, actual) in reference.iter().zip(list.iter()) {
                    assert_eq!(expected, actual);
                }
                for (frozen, expected) in snapshots.iter() {
                    let actual: Vec<u32> = frozen.iter().copied().collect();
                    assert_eq!(expected, &actual);
                }
            }
        }
    }

    proptest_state_machine::prop_state_machine! {
        #![proptest_config(Config {
            // no regression file for the state machine runs
            failure_persistence: None,
            .. Config::default()
        })]

        #[test]
        fn linked_list_state_machine_test(sequential 1..100 => LinkedList<u32>);
    }

    /// The possible transitions of the state machine.
    #[derive(Clone, Debug)]
    pub enum Transition {
        Push(u32),
        Append(u32),
        Pop,
        RemoveLast,
    }

    pub struct LinkedListStateMachine;

    // Implementation of the reference state machine that drives the test.
    impl ReferenceStateMachine for LinkedListStateMachine {
        type State = VecDeque<u32>;
        type Transition = Transition;

        fn init_state() -> BoxedStrategy<Self::State> {
            Just(VecDeque::new()).boxed()
        }

        fn transitions(_state: &Self::State) -> BoxedStrategy<Self::Transition> {
            prop_oneof![
                2 => (any::<u32>()).prop_map(Transition::Push),
                2 => (any::<u32>()).prop_map(Transition::Append),
                1 => Just(Transition::Pop),
                1 => Just(Transition::RemoveLast),
            ]
            .boxed()
        }

        fn apply(mut state: Self::State, transition: &Self::Transition) -> Self::State {
            match transition {
                Transition::Push(value) => state.push_front(*value),
                Transition::Append(value) => state.push_back(*value),
                Transition::Pop => {
                    state.pop_front();
                }
                Transition::RemoveLast => {
                    state.pop_back();
                }
            }
            state
        }
    }

    impl StateMachineTest for LinkedList<u32> {
        type SystemUnderTest = Self;
        type Reference = LinkedListStateMachine;

        fn init_test(
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) -> Self::SystemUnderTest {
            Self::new()
        }

        fn apply(
            mut state: Self::SystemUnderTest,
            _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
            transition: Transition,
        ) -> Self::SystemUnderTest {
            match transition {
                Transition::Push(value) => state.push(value),
                Transition::Append(value) => state.append(value),
                Transition::Pop => {
                    state.pop();
                }
                Transition::RemoveLast => {
                    state.remove_last();
                }
            }
            state
        }

        fn check_invariants(
            state: &Self::SystemUnderTest,
            ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        ) {
            assert_eq!(state.len(), ref_state.len());
            assert_eq!(state.is_empty(), ref_state.is_empty());

            for (value, expected) in state.iter().zip(ref_state.iter()) {
                assert_eq!(value, expected);
            }
        }
    }
}
