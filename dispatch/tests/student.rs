use dispatch::{
    demo::introduce,
    person::{Person, defaults},
    student::{Student, report_gpa},
};

mod common;

#[test]
pub fn liam_does_well() {
    let registry = common::registry();
    let liam = Student::new(&registry, 19, "Liam", 3.8).unwrap();

    let output = common::capture(|out| introduce(liam.upcast(), out));

    assert_eq!(
        "Hello world, I'm Liam!\nI am 19 years old, and doing Well in class!\n",
        output
    );
}

#[test]
pub fn ann_does_poorly() {
    let registry = common::registry();
    let ann = Student::new(&registry, 20, "Ann", 2.0).unwrap();

    let output = common::capture(|out| ann.upcast().describe(out));

    assert_eq!("I am 20 years old, and doing Poorly in class!\n", output);
}

#[test]
pub fn threshold_itself_is_poorly() {
    let registry = common::registry();
    let student = Student::new(&registry, 21, "Eve", 2.6).unwrap();

    let output = common::capture(|out| student.describe(out));

    assert_eq!("I am 21 years old, and doing Poorly in class!\n", output);
}

#[test]
pub fn describe_is_the_same_through_both_views() {
    let registry = common::registry();
    let student = Student::new(&registry, 19, "Liam", 3.8).unwrap();

    let through_person = common::capture(|out| student.upcast().describe(out));
    let through_student = common::capture(|out| student.describe(out));

    assert_eq!(through_person, through_student);
    assert_ne!(
        common::capture(|out| defaults::describe(student.upcast(), out)),
        through_person
    );
}

#[test]
pub fn greet_is_inherited_unchanged() {
    let registry = common::registry();
    let student = Student::new(&registry, 19, "Liam", 3.8).unwrap();
    let person = Person::new(&registry, 19, "Liam").unwrap();

    let through_person = common::capture(|out| student.upcast().greet(out));
    let through_student = common::capture(|out| student.greet(out));
    let plain_person = common::capture(|out| person.upcast().greet(out));

    assert_eq!("Hello world, I'm Liam!\n", through_person);
    assert_eq!(through_person, through_student);
    assert_eq!(through_person, plain_person);
}

#[test]
pub fn gpa_survives_inherited_operations() {
    let registry = common::registry();
    let mut student = Student::new(&registry, 19, "Liam", 3.8).unwrap();

    student.grow();
    student.upcast_mut().grow();
    let _ = common::capture(|out| student.upcast().greet(out));

    assert_eq!(21, student.age());
    assert_eq!(21, student.upcast().age());
    assert_eq!("Liam", student.name());
    assert!((student.gpa() - 3.8).abs() < f64::EPSILON);
}

#[test]
pub fn grow_shows_up_in_the_override() {
    let registry = common::registry();
    let mut student = Student::new(&registry, 19, "Liam", 3.8).unwrap();

    student.upcast_mut().grow();

    let output = common::capture(|out| student.upcast().describe(out));
    assert_eq!("I am 20 years old, and doing Well in class!\n", output);
}

#[test]
pub fn report_gpa_reads_the_field_directly() {
    let registry = common::registry();
    let student = Student::new(&registry, 19, "Liam", 3.8).unwrap();

    let output = common::capture(|out| report_gpa(&student, out));

    assert_eq!("Liam's GPA is 3.80\n", output);
}

#[test]
pub fn student_is_bound_to_the_student_table() {
    let registry = common::registry();
    let student = Student::new(&registry, 19, "Liam", 3.8).unwrap();

    assert!(std::sync::Arc::ptr_eq(
        registry.student(),
        student.base().table()
    ));
}
