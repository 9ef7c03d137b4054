use std::io;

use tracing::debug;

use crate::{
    allocation::{AllocError, Allocate},
    errors::Error,
    person::Object,
    registry::Registry,
    student::{Student, report_gpa},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub age: u32,
    pub name: String,
    pub gpa: f64,
    pub show_layout: bool,
    pub report_gpa: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            age: 19,
            name: "Liam".to_string(),
            gpa: 3.8,
            show_layout: false,
            report_gpa: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    ConstructionFailed(AllocError),
}

impl Outcome {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::ConstructionFailed(_) => 1,
        }
    }
}

/// Works with any record of the hierarchy, knowing only the operations declared
/// by `Person`.
pub fn introduce(person: &Object, out: &mut dyn io::Write) -> io::Result<()> {
    person.greet(out)?;
    person.describe(out)
}

/// Sets up the method tables, then builds one student and introduces it.
pub fn run<A: Allocate>(
    allocator: &A,
    config: &DemoConfig,
    out: &mut dyn io::Write,
) -> Result<Outcome, Error> {
    let registry = Registry::initialize()?;
    debug!(tables = registry.tables().count(), "method tables ready");

    if config.show_layout {
        for table in registry.tables() {
            writeln!(out, "{table}")?;
        }
    }

    let student = match Student::new_in(
        &registry,
        allocator,
        config.age,
        config.name.as_str(),
        config.gpa,
    ) {
        Ok(student) => student,
        Err(error) => return Ok(Outcome::ConstructionFailed(error)),
    };

    introduce(student.upcast(), out)?;

    if config.report_gpa {
        report_gpa(&student, out)?;
    }

    student.release();

    Ok(Outcome::Completed)
}
