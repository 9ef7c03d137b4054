use std::sync::Arc;

use crate::{
    person::{self, Object},
    student,
    vtable::{MethodTable, TableError},
};

/// The method table of every type, built once at startup, parents first.
///
/// Records keep a shared reference to their table, so the tables outlive any
/// record built from them even if the registry itself is dropped.
#[derive(Debug)]
pub struct Registry {
    person: Arc<MethodTable<Object>>,
    student: Arc<MethodTable<Object>>,
}

impl Registry {
    pub fn initialize() -> Result<Self, TableError> {
        let person = Arc::new(person::initialize_table()?);
        let student = Arc::new(student::initialize_table(&person)?);

        Ok(Self { person, student })
    }

    pub const fn person(&self) -> &Arc<MethodTable<Object>> {
        &self.person
    }

    pub const fn student(&self) -> &Arc<MethodTable<Object>> {
        &self.student
    }

    pub fn tables(&self) -> impl Iterator<Item = &MethodTable<Object>> {
        [&*self.person, &*self.student].into_iter()
    }
}
