use std::{
    any::Any,
    fmt::{Debug, Formatter},
    io,
    sync::Arc,
};

use dispatch_derive::SlotLayout;

use crate::{
    allocation::{AllocError, Allocate, Heap},
    person::{Handle, Object, Person, PersonSlot, Record},
    registry::Registry,
    vtable::{Method, MethodTable, SlotLayout as _, TableBuilder, TableError},
};

/// A gpa strictly above this counts as doing well.
pub const STANDING_THRESHOLD: f64 = 2.6;

#[derive(SlotLayout, Debug, Clone, Copy, PartialEq, Eq)]
#[type_name("student")]
#[extends(PersonSlot)]
pub enum StudentSlot {
    #[inherited]
    Release,
    #[inherited]
    Greet,
    #[inherited]
    Describe,
    #[inherited]
    Grow,
    #[inherited]
    GetAge,
    #[inherited]
    GetName,
    GetGpa,
}

pub struct Student {
    base: Person,
    gpa: f64,
}

impl Student {
    pub fn new(
        registry: &Registry,
        age: u32,
        name: impl Into<String>,
        gpa: f64,
    ) -> Result<Handle<Self>, AllocError> {
        Self::new_in(registry, &Heap, age, name, gpa)
    }

    pub fn new_in<A: Allocate>(
        registry: &Registry,
        allocator: &A,
        age: u32,
        name: impl Into<String>,
        gpa: f64,
    ) -> Result<Handle<Self>, AllocError> {
        // the leading person is bound to the student table, not the person one
        let record = allocator.allocate(Self {
            base: Person::bind(registry.student(), age, name.into()),
            gpa,
        })?;

        Ok(Handle::new(record))
    }

    pub const fn base(&self) -> &Person {
        &self.base
    }

    fn table(&self) -> &MethodTable<Object> {
        self.base.table()
    }

    fn downcast(this: &Object) -> &Self {
        match this.as_any().downcast_ref::<Self>() {
            Some(student) => student,
            None => panic!(
                "a student entry point was reached through a {} record",
                this.person().table().type_name()
            ),
        }
    }

    pub fn greet(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let greet = self.table().output(StudentSlot::Greet.index());
        greet(self, out)
    }

    pub fn describe(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let describe = self.table().output(StudentSlot::Describe.index());
        describe(self, out)
    }

    pub fn grow(&mut self) {
        let grow = self.table().mutator(StudentSlot::Grow.index());
        grow(self);
    }

    pub fn age(&self) -> u32 {
        let age = self.table().unsigned(StudentSlot::GetAge.index());
        age(self)
    }

    pub fn name(&self) -> &str {
        let name = self.table().text(StudentSlot::GetName.index());
        name(self)
    }

    /// Nothing above `Student` declares this slot, so [`overrides::gpa`] can be
    /// called directly instead.
    pub fn gpa(&self) -> f64 {
        let gpa = self.table().real(StudentSlot::GetGpa.index());
        gpa(self)
    }
}

impl Record for Student {
    fn person(&self) -> &Person {
        &self.base
    }

    fn person_mut(&mut self) -> &mut Person {
        &mut self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Debug for Student {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Student")
            .field("base", &self.base)
            .field("gpa", &self.gpa)
            .finish()
    }
}

pub mod overrides {
    use std::io;

    use super::{STANDING_THRESHOLD, Student};
    use crate::person::Object;

    pub fn describe(this: &Object, out: &mut dyn io::Write) -> io::Result<()> {
        let student = Student::downcast(this);
        let standing = if student.gpa > STANDING_THRESHOLD {
            "Well"
        } else {
            "Poorly"
        };

        writeln!(
            out,
            "I am {} years old, and doing {standing} in class!",
            student.base.age
        )
    }

    pub fn gpa(this: &Object) -> f64 {
        Student::downcast(this).gpa
    }
}

/// Reports the gpa of a record known to be a `Student`, without going through
/// the table.
pub fn report_gpa(student: &Student, out: &mut dyn io::Write) -> io::Result<()> {
    writeln!(
        out,
        "{}'s GPA is {:.2}",
        student.base.name,
        overrides::gpa(student)
    )
}

pub(crate) fn initialize_table(
    person: &Arc<MethodTable<Object>>,
) -> Result<MethodTable<Object>, TableError> {
    TableBuilder::<StudentSlot, Object>::extending::<PersonSlot>(person)?
        .implement(StudentSlot::Describe, Method::Output(overrides::describe))
        .implement(StudentSlot::GetGpa, Method::Real(overrides::gpa))
        .build()
}
