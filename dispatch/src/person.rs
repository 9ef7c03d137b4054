use std::{
    any::Any,
    fmt::{Debug, Formatter},
    io,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use dispatch_derive::SlotLayout;

use crate::{
    allocation::{AllocError, Allocate, Heap},
    registry::Registry,
    vtable::{Method, MethodTable, SlotLayout as _, TableBuilder, TableError},
};

/// A record whose leading component is a [`Person`]. Every record of the
/// hierarchy can be viewed as an [`Object`], the base-typed view that virtual
/// calls go through.
pub trait Record: Any {
    fn person(&self) -> &Person;
    fn person_mut(&mut self) -> &mut Person;
    fn as_any(&self) -> &dyn Any;
}

pub type Object = dyn Record;

#[derive(SlotLayout, Debug, Clone, Copy, PartialEq, Eq)]
#[type_name("person")]
pub enum PersonSlot {
    Release,
    Greet,
    Describe,
    Grow,
    GetAge,
    GetName,
}

pub struct Person {
    // set once in `bind`, never reassigned
    table: Arc<MethodTable<Object>>,
    pub(crate) name: String,
    pub(crate) age: u32,
}

impl Person {
    pub fn new(
        registry: &Registry,
        age: u32,
        name: impl Into<String>,
    ) -> Result<Handle<Self>, AllocError> {
        Self::new_in(registry, &Heap, age, name)
    }

    pub fn new_in<A: Allocate>(
        registry: &Registry,
        allocator: &A,
        age: u32,
        name: impl Into<String>,
    ) -> Result<Handle<Self>, AllocError> {
        let record = allocator.allocate(Self::bind(registry.person(), age, name.into()))?;

        Ok(Handle::new(record))
    }

    pub(crate) fn bind(table: &Arc<MethodTable<Object>>, age: u32, name: String) -> Self {
        Self {
            table: Arc::clone(table),
            name,
            age,
        }
    }

    pub const fn table(&self) -> &Arc<MethodTable<Object>> {
        &self.table
    }
}

impl Record for Person {
    fn person(&self) -> &Person {
        self
    }

    fn person_mut(&mut self) -> &mut Person {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Debug for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Person")
            .field("table", &self.table.type_name())
            .field("name", &self.name)
            .field("age", &self.age)
            .finish()
    }
}

// Virtual calls. Each one reads the entry from the record's own table, so a
// record built by a subtype reaches the subtype's overrides.
impl dyn Record {
    pub(crate) fn release(&mut self) {
        let release = self.person().table.releaser(PersonSlot::Release.index());
        release(self);
    }

    pub fn greet(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let greet = self.person().table.output(PersonSlot::Greet.index());
        greet(self, out)
    }

    pub fn describe(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let describe = self.person().table.output(PersonSlot::Describe.index());
        describe(self, out)
    }

    pub fn grow(&mut self) {
        let grow = self.person().table.mutator(PersonSlot::Grow.index());
        grow(self);
    }

    pub fn age(&self) -> u32 {
        let age = self.person().table.unsigned(PersonSlot::GetAge.index());
        age(self)
    }

    pub fn name(&self) -> &str {
        let name = self.person().table.text(PersonSlot::GetName.index());
        name(self)
    }
}

/// The implementations `Person` puts in its table. Subtypes inherit the ones
/// they do not override.
///
/// `release` is a teardown hook only; the owning `Handle` frees the
/// record's memory after the hook returns.
pub mod defaults {
    use std::io;

    use tracing::debug;

    use super::Object;

    pub fn release(this: &mut Object) {
        let person = this.person();

        debug!(
            name = %person.name,
            type_name = %person.table.type_name(),
            "releasing record"
        );
    }

    pub fn greet(this: &Object, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "Hello world, I'm {}!", this.person().name)
    }

    pub fn describe(this: &Object, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "I am {} years old.", this.person().age)
    }

    pub fn grow(this: &mut Object) {
        let person = this.person_mut();
        person.age = person.age.wrapping_add(1);
    }

    pub fn age(this: &Object) -> u32 {
        this.person().age
    }

    pub fn name(this: &Object) -> &str {
        &this.person().name
    }
}

pub(crate) fn initialize_table() -> Result<MethodTable<Object>, TableError> {
    TableBuilder::<PersonSlot, Object>::root()
        .implement(PersonSlot::Release, Method::Release(defaults::release))
        .implement(PersonSlot::Greet, Method::Output(defaults::greet))
        .implement(PersonSlot::Describe, Method::Output(defaults::describe))
        .implement(PersonSlot::Grow, Method::Mutate(defaults::grow))
        .implement(PersonSlot::GetAge, Method::Unsigned(defaults::age))
        .implement(PersonSlot::GetName, Method::Text(defaults::name))
        .build()
}

/// Sole owner of a heap-allocated record.
///
/// Dropping the handle, or calling [`Handle::release`], runs the release slot
/// of the record's table once and then frees the record.
pub struct Handle<T: Record> {
    record: Box<T>,
}

impl<T: Record> Handle<T> {
    pub(crate) fn new(record: Box<T>) -> Self {
        Self { record }
    }

    pub fn upcast(&self) -> &Object {
        &*self.record
    }

    pub fn upcast_mut(&mut self) -> &mut Object {
        &mut *self.record
    }

    pub fn release(self) {
        drop(self);
    }
}

impl<T: Record> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T: Record> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.record
    }
}

impl<T: Record + Debug> Debug for Handle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Handle").field(&self.record).finish()
    }
}

impl<T: Record> Drop for Handle<T> {
    fn drop(&mut self) {
        self.upcast_mut().release();
    }
}
