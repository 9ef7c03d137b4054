use std::{
    fmt::{Debug, Display, Formatter},
    io,
    marker::PhantomData,
    sync::Arc,
};

use itertools::Itertools as _;
use thiserror::Error;
use tracing::{debug, trace};

use crate::identifier::Identifier;

/// Fieldless enum naming the operations of one type, one variant per slot. The
/// discriminant of a variant is the slot index. Implemented with
/// `#[derive(SlotLayout)]`.
///
/// A subtype names its parent with `#[extends(..)]` and repeats every parent
/// slot first, in the parent's order, each marked `#[inherited]`:
///
/// ```
/// use dispatch::person::PersonSlot;
/// use dispatch_derive::SlotLayout;
///
/// #[derive(SlotLayout, Clone, Copy)]
/// #[type_name("teacher")]
/// #[extends(PersonSlot)]
/// enum TeacherSlot {
///     #[inherited] Release,
///     #[inherited] Greet,
///     #[inherited] Describe,
///     #[inherited] Grow,
///     #[inherited] GetAge,
///     #[inherited] GetName,
///     GetSubject,
/// }
///
/// fn main() {
///     use dispatch::vtable::SlotLayout as _;
///     assert_eq!(6, TeacherSlot::GetSubject.index());
///     assert_eq!("get_subject", TeacherSlot::GetSubject.name());
/// }
/// ```
///
/// Leaving out a parent slot makes the generated `From<PersonSlot>`
/// non-exhaustive:
///
/// ```compile_fail,E0004
/// use dispatch::person::PersonSlot;
/// use dispatch_derive::SlotLayout;
///
/// #[derive(SlotLayout, Clone, Copy)]
/// #[type_name("teacher")]
/// #[extends(PersonSlot)]
/// enum TeacherSlot {
///     #[inherited] Release,
///     #[inherited] Greet,
///     #[inherited] Describe,
///     #[inherited] Grow,
///     #[inherited] GetAge,
/// }
///
/// fn main() {}
/// ```
///
/// Reordering inherited slots fails the index check at compile time:
///
/// ```compile_fail,E0080
/// use dispatch::person::PersonSlot;
/// use dispatch_derive::SlotLayout;
///
/// #[derive(SlotLayout, Clone, Copy)]
/// #[type_name("teacher")]
/// #[extends(PersonSlot)]
/// enum TeacherSlot {
///     #[inherited] Release,
///     #[inherited] Describe,
///     #[inherited] Greet,
///     #[inherited] Grow,
///     #[inherited] GetAge,
///     #[inherited] GetName,
/// }
///
/// fn main() {}
/// ```
///
/// An inherited slot after a slot of the subtype's own is rejected by the
/// derive:
///
/// ```compile_fail
/// use dispatch::person::PersonSlot;
/// use dispatch_derive::SlotLayout;
///
/// #[derive(SlotLayout, Clone, Copy)]
/// #[type_name("teacher")]
/// #[extends(PersonSlot)]
/// enum TeacherSlot {
///     #[inherited] Release,
///     #[inherited] Greet,
///     #[inherited] Describe,
///     #[inherited] Grow,
///     #[inherited] GetAge,
///     GetSubject,
///     #[inherited] GetName,
/// }
///
/// fn main() {}
/// ```
///
/// So is `#[inherited]` on a layout without a parent:
///
/// ```compile_fail
/// use dispatch_derive::SlotLayout;
///
/// #[derive(SlotLayout, Clone, Copy)]
/// #[type_name("orphan")]
/// enum OrphanSlot {
///     #[inherited] Release,
/// }
///
/// fn main() {}
/// ```
pub trait SlotLayout: Copy + 'static {
    const TYPE_NAME: &'static str;
    const SLOTS: &'static [Self];

    fn index(self) -> usize;
    fn name(self) -> &'static str;
}

/// A layout that starts with every slot of `P`, at the same indices.
pub trait Extends<P: SlotLayout>: SlotLayout + From<P> {}

pub type ReleaseFn<R> = fn(&mut R);
pub type OutputFn<R> = fn(&R, &mut dyn io::Write) -> io::Result<()>;
pub type MutateFn<R> = fn(&mut R);
pub type UnsignedFn<R> = fn(&R) -> u32;
pub type TextFn<R> = fn(&R) -> &str;
pub type RealFn<R> = fn(&R) -> f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Release,
    Output,
    Mutate,
    Unsigned,
    Text,
    Real,
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Output => write!(f, "output"),
            Self::Mutate => write!(f, "mutate"),
            Self::Unsigned => write!(f, "unsigned"),
            Self::Text => write!(f, "text"),
            Self::Real => write!(f, "real"),
        }
    }
}

/// Entry point stored in a slot, tagged with its signature.
pub enum Method<R: ?Sized> {
    Release(ReleaseFn<R>),
    Output(OutputFn<R>),
    Mutate(MutateFn<R>),
    Unsigned(UnsignedFn<R>),
    Text(TextFn<R>),
    Real(RealFn<R>),
}

impl<R: ?Sized> Clone for Method<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ?Sized> Copy for Method<R> {}

impl<R: ?Sized> Debug for Method<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Method({})", self.signature())
    }
}

impl<R: ?Sized> Method<R> {
    pub const fn signature(&self) -> Signature {
        match self {
            Self::Release(_) => Signature::Release,
            Self::Output(_) => Signature::Output,
            Self::Mutate(_) => Signature::Mutate,
            Self::Unsigned(_) => Signature::Unsigned,
            Self::Text(_) => Signature::Text,
            Self::Real(_) => Signature::Real,
        }
    }

    /// Whether both entries have the same signature and point at the same function.
    pub fn same_entry(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Release(l), Self::Release(r)) | (Self::Mutate(l), Self::Mutate(r)) => {
                std::ptr::fn_addr_eq(*l, *r)
            }
            (Self::Output(l), Self::Output(r)) => std::ptr::fn_addr_eq(*l, *r),
            (Self::Unsigned(l), Self::Unsigned(r)) => std::ptr::fn_addr_eq(*l, *r),
            (Self::Text(l), Self::Text(r)) => std::ptr::fn_addr_eq(*l, *r),
            (Self::Real(l), Self::Real(r)) => std::ptr::fn_addr_eq(*l, *r),
            _ => false,
        }
    }
}

pub struct Slot<R: ?Sized> {
    name: Identifier,
    // the type whose implementation fills the slot
    owner: Identifier,
    method: Method<R>,
}

impl<R: ?Sized> Clone for Slot<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ?Sized> Copy for Slot<R> {}

impl<R: ?Sized> Debug for Slot<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("method", &self.method)
            .finish()
    }
}

impl<R: ?Sized> Slot<R> {
    pub const fn name(&self) -> Identifier {
        self.name
    }

    pub const fn owner(&self) -> Identifier {
        self.owner
    }

    pub const fn method(&self) -> Method<R> {
        self.method
    }
}

/// Per-type table of entry points, indexed by slot. Immutable once built.
pub struct MethodTable<R: ?Sized> {
    type_name: Identifier,
    parent: Option<Arc<MethodTable<R>>>,
    slots: Vec<Slot<R>>,
}

impl<R: ?Sized> MethodTable<R> {
    pub const fn type_name(&self) -> Identifier {
        self.type_name
    }

    pub const fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    pub fn ancestors(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(self.parent.as_deref(), |table| table.parent.as_deref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot<R>> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[Slot<R>] {
        &self.slots
    }

    pub fn slot_names(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.slots.iter().map(|slot| slot.name)
    }

    /// Whether the slot at `index` holds an implementation supplied by this type
    /// rather than one inherited from an ancestor.
    pub fn defined_here(&self, index: usize) -> bool {
        self.slot(index)
            .is_some_and(|slot| slot.owner == self.type_name)
    }

    fn entry(&self, index: usize) -> Method<R> {
        let Some(slot) = self.slots.get(index) else {
            panic!(
                "slot {index} is out of range for the {} method table with {} slots",
                self.type_name,
                self.slots.len()
            );
        };

        trace!(type_name = %self.type_name, slot = %slot.name, owner = %slot.owner, "dispatch");

        slot.method
    }

    fn mismatch(&self, index: usize, expected: Signature, found: Method<R>) -> ! {
        panic!(
            "slot {index} of the {} method table holds a {} entry, called as {expected}",
            self.type_name,
            found.signature()
        );
    }

    pub fn releaser(&self, index: usize) -> ReleaseFn<R> {
        match self.entry(index) {
            Method::Release(callback) => callback,
            other => self.mismatch(index, Signature::Release, other),
        }
    }

    pub fn output(&self, index: usize) -> OutputFn<R> {
        match self.entry(index) {
            Method::Output(callback) => callback,
            other => self.mismatch(index, Signature::Output, other),
        }
    }

    pub fn mutator(&self, index: usize) -> MutateFn<R> {
        match self.entry(index) {
            Method::Mutate(callback) => callback,
            other => self.mismatch(index, Signature::Mutate, other),
        }
    }

    pub fn unsigned(&self, index: usize) -> UnsignedFn<R> {
        match self.entry(index) {
            Method::Unsigned(callback) => callback,
            other => self.mismatch(index, Signature::Unsigned, other),
        }
    }

    pub fn text(&self, index: usize) -> TextFn<R> {
        match self.entry(index) {
            Method::Text(callback) => callback,
            other => self.mismatch(index, Signature::Text, other),
        }
    }

    pub fn real(&self, index: usize) -> RealFn<R> {
        match self.entry(index) {
            Method::Real(callback) => callback,
            other => self.mismatch(index, Signature::Real, other),
        }
    }
}

impl<R: ?Sized> Display for MethodTable<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slots = self
            .slots
            .iter()
            .map(|slot| {
                if slot.owner == self.type_name {
                    format!("{}*", slot.name)
                } else {
                    slot.name.to_string()
                }
            })
            .join(", ");

        write!(f, "{} [{slots}]", self.type_name)
    }
}

impl<R: ?Sized> Debug for MethodTable<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("type_name", &self.type_name)
            .field("parent", &self.parent.as_ref().map(|x| x.type_name))
            .field("slots", &self.slots)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("{type_name} does not provide an implementation for slot {slot}")]
    MissingSlot {
        type_name: Identifier,
        slot: Identifier,
    },
    #[error("{type_name} overrides {slot} with a {found} entry, but the inherited entry is {expected}")]
    SignatureMismatch {
        type_name: Identifier,
        slot: Identifier,
        expected: Signature,
        found: Signature,
    },
    #[error("{type_name} extends {expected}, but was given the {found} method table")]
    ParentMismatch {
        type_name: Identifier,
        expected: Identifier,
        found: Identifier,
    },
    #[error("{type_name} expects {parent} to have {expected} slots, but its table has {found}")]
    ParentLayoutMismatch {
        type_name: Identifier,
        parent: Identifier,
        expected: usize,
        found: usize,
    },
}

/// Assembles the method table of the type described by `S`.
///
/// A root table starts empty. A derived table starts as a copy of its parent's
/// entries; `implement` on an inherited slot overrides it, on a new slot defines it.
pub struct TableBuilder<S: SlotLayout, R: ?Sized> {
    type_name: Identifier,
    parent: Option<Arc<MethodTable<R>>>,
    slots: Vec<Option<Slot<R>>>,
    layout: PhantomData<S>,
}

impl<S: SlotLayout, R: ?Sized> TableBuilder<S, R> {
    pub fn root() -> Self {
        Self {
            type_name: Identifier::parse(S::TYPE_NAME),
            parent: None,
            slots: vec![None; S::SLOTS.len()],
            layout: PhantomData,
        }
    }

    pub fn extending<P: SlotLayout>(parent: &Arc<MethodTable<R>>) -> Result<Self, TableError>
    where
        S: Extends<P>,
    {
        let type_name = Identifier::parse(S::TYPE_NAME);

        if parent.type_name != P::TYPE_NAME {
            return Err(TableError::ParentMismatch {
                type_name,
                expected: Identifier::parse(P::TYPE_NAME),
                found: parent.type_name,
            });
        }

        if parent.len() != P::SLOTS.len() {
            return Err(TableError::ParentLayoutMismatch {
                type_name,
                parent: parent.type_name,
                expected: P::SLOTS.len(),
                found: parent.len(),
            });
        }

        let mut slots = vec![None; S::SLOTS.len()];
        for &parent_slot in P::SLOTS {
            slots[S::from(parent_slot).index()] = parent.slot(parent_slot.index()).copied();
        }

        Ok(Self {
            type_name,
            parent: Some(Arc::clone(parent)),
            slots,
            layout: PhantomData,
        })
    }

    #[must_use]
    pub fn implement(mut self, slot: S, method: Method<R>) -> Self {
        self.slots[slot.index()] = Some(Slot {
            name: Identifier::parse(slot.name()),
            owner: self.type_name,
            method,
        });

        self
    }

    pub fn build(self) -> Result<MethodTable<R>, TableError> {
        let mut slots = Vec::with_capacity(self.slots.len());

        for (&layout_slot, slot) in S::SLOTS.iter().zip(self.slots) {
            let Some(slot) = slot else {
                return Err(TableError::MissingSlot {
                    type_name: self.type_name,
                    slot: Identifier::parse(layout_slot.name()),
                });
            };

            let inherited = self
                .parent
                .as_ref()
                .and_then(|parent| parent.slot(layout_slot.index()));

            if let Some(inherited) = inherited {
                if inherited.method.signature() != slot.method.signature() {
                    return Err(TableError::SignatureMismatch {
                        type_name: self.type_name,
                        slot: slot.name,
                        expected: inherited.method.signature(),
                        found: slot.method.signature(),
                    });
                }
            }

            slots.push(slot);
        }

        let table = MethodTable {
            type_name: self.type_name,
            parent: self.parent,
            slots,
        };

        debug!(
            type_name = %table.type_name,
            slots = table.len(),
            layout = %table,
            "initialized method table"
        );

        Ok(table)
    }
}
