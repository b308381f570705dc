//! Decoded reply records and their owned payload structure.
//!
//! A [`Reply`] is the in-memory form of one server response: a status code, a
//! secondary code, and a [`ReplyBody`] holding the payload for exactly one
//! variant. Payload sequences are [`Chain`]s — owned singly linked lists whose
//! `Drop` walks the links iteratively, so releasing a record releases its
//! entire reachable structure exactly once regardless of depth. Absent
//! sub-structure is `None` and releases as a no-op.
//!
//! Once returned from a read, a record is owned solely by the caller; no other
//! component retains a reference to it.

use std::fmt;

/// Ordered list of job identifiers returned by a select reply.
pub type SelectList = Chain<String>;

/// Ordered list of per-object status entries returned by a status reply.
pub type StatusList = Chain<StatusEntry>;

/// Ordered list of attributes owned by one [`StatusEntry`].
pub type AttrList = Chain<Attribute>;

/// One decoded server reply.
#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    code: u32,
    aux_code: u32,
    body: ReplyBody,
}

impl Reply {
    /// Assemble a reply record, typically on the encoding side of the wire.
    #[must_use]
    pub fn new(code: u32, aux_code: u32, body: ReplyBody) -> Self {
        Self {
            code,
            aux_code,
            body,
        }
    }

    /// Server-reported status: `0` is success, any other value is a
    /// domain-specific condition carried back from the server.
    ///
    /// A nonzero code is not a decode failure; the record is fully valid and
    /// the caller inspects the code.
    #[must_use]
    pub fn code(&self) -> u32 { self.code }

    /// Secondary server code qualifying [`code`](Self::code).
    #[must_use]
    pub fn aux_code(&self) -> u32 { self.aux_code }

    /// Active variant payload.
    #[must_use]
    pub fn body(&self) -> &ReplyBody { &self.body }

    /// Consume the record, yielding its payload.
    #[must_use]
    pub fn into_body(self) -> ReplyBody { self.body }
}

/// Payload of a reply, tagged by variant.
///
/// Exactly one payload shape exists per record by construction; release is an
/// ordinary drop of the active arm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyBody {
    /// Variants carrying no payload.
    Empty,
    /// Optional server text; `None` models an absent message. The sole
    /// carrier of failure text from the server.
    Text(Option<String>),
    /// Job identifiers matching a selection request; may be empty.
    Select(SelectList),
    /// Per-object status entries, each owning its attribute list.
    Status(StatusList),
    /// Resource availability counts, each array independently optional.
    ResourceQuery(ResourceQuery),
}

impl ReplyBody {
    /// Variant name for diagnostics and log fields.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Select(_) => "select",
            Self::Status(_) => "status",
            Self::ResourceQuery(_) => "resource-query",
        }
    }
}

/// Status of one object (job, queue, ...) within a status reply.
///
/// The object kind discriminant passes through from the wire; this layer does
/// not interpret it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    /// Object class discriminant, uninterpreted.
    pub kind: u8,
    /// Name of the object this entry describes.
    pub name: String,
    /// Attributes reported for the object.
    pub attributes: AttrList,
}

/// One attribute of a status entry: up to three independently absent strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attribute {
    pub name: Option<String>,
    pub resource: Option<String>,
    pub value: Option<String>,
}

/// Resource counts returned by a resource query reply.
///
/// Each array is independently optional; `None` means the server omitted it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub available: Option<Vec<u64>>,
    pub allocated: Option<Vec<u64>>,
    pub reserved: Option<Vec<u64>>,
    pub down: Option<Vec<u64>>,
}

/// Owned singly linked list preserving insertion order.
///
/// Built front-to-back by [`FromIterator`] or [`push_back`](Self::push_back).
/// Dropping the list walks the links iteratively rather than recursing, so
/// arbitrarily long chains release without exhausting the stack.
///
/// # Examples
///
/// ```
/// use batchwire::Chain;
///
/// let chain: Chain<u32> = [1, 2, 3].into_iter().collect();
/// assert_eq!(chain.len(), 3);
/// assert_eq!(chain.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
pub struct Chain<T> {
    head: Option<Box<ChainNode<T>>>,
    len: usize,
}

struct ChainNode<T> {
    value: T,
    next: Option<Box<ChainNode<T>>>,
}

impl<T> Chain<T> {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self { Self { head: None, len: 0 } }

    /// Number of nodes in the chain.
    #[must_use]
    pub fn len(&self) -> usize { self.len }

    /// Returns `true` when the chain holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Append a value, preserving insertion order.
    ///
    /// Walks to the tail; prefer collecting from an iterator when building a
    /// whole chain at once.
    pub fn push_back(&mut self, value: T) {
        let mut cursor = &mut self.head;
        while let Some(node) = cursor {
            cursor = &mut node.next;
        }
        *cursor = Some(Box::new(ChainNode { value, next: None }));
        self.len += 1;
    }

    /// Iterate over the values front to back.
    pub fn iter(&self) -> ChainIter<'_, T> {
        ChainIter {
            node: self.head.as_deref(),
            remaining: self.len,
        }
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        // Unlink before dropping each node so the Box drop never recurses
        // down the chain.
        let mut next = self.head.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Self::new();
        let mut tail = &mut chain.head;
        for value in iter {
            let node = tail.insert(Box::new(ChainNode { value, next: None }));
            tail = &mut node.next;
            chain.len += 1;
        }
        chain
    }
}

impl<T: Clone> Clone for Chain<T> {
    fn clone(&self) -> Self {
        // Rebuild via iteration so cloning never recurses down the chain.
        self.iter().cloned().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Chain<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Chain<T> {}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = ChainIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Borrowing iterator over a [`Chain`].
pub struct ChainIter<'a, T> {
    node: Option<&'a ChainNode<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for ChainIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) { (self.remaining, Some(self.remaining)) }
}

impl<T> ExactSizeIterator for ChainIter<'_, T> {}
