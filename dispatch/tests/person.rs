use dispatch::person::{Person, defaults};

mod common;

#[test]
pub fn age_and_name_match_construction() {
    let registry = common::registry();
    let person = Person::new(&registry, 42, "Ada").unwrap();

    assert_eq!(42, person.upcast().age());
    assert_eq!("Ada", person.upcast().name());
}

#[test]
pub fn grow_adds_one_year() {
    let registry = common::registry();
    let mut person = Person::new(&registry, 42, "Ada").unwrap();

    person.upcast_mut().grow();
    assert_eq!(43, person.upcast().age());

    person.upcast_mut().grow();
    person.upcast_mut().grow();
    assert_eq!(45, person.upcast().age());
}

#[test]
pub fn grow_wraps_at_the_maximum_age() {
    let registry = common::registry();
    let mut person = Person::new(&registry, u32::MAX, "Old").unwrap();

    person.upcast_mut().grow();
    assert_eq!(0, person.upcast().age());
}

#[test]
pub fn greet_and_describe() {
    let registry = common::registry();
    let person = Person::new(&registry, 42, "Ada").unwrap();

    let output = common::capture(|out| {
        person.upcast().greet(out)?;
        person.upcast().describe(out)
    });

    assert_eq!("Hello world, I'm Ada!\nI am 42 years old.\n", output);
}

#[test]
pub fn virtual_calls_reach_the_defaults() {
    let registry = common::registry();
    let person = Person::new(&registry, 7, "Bo").unwrap();
    let view = person.upcast();

    assert_eq!(
        common::capture(|out| defaults::greet(view, out)),
        common::capture(|out| view.greet(out))
    );
    assert_eq!(
        common::capture(|out| defaults::describe(view, out)),
        common::capture(|out| view.describe(out))
    );
    assert_eq!(defaults::age(view), view.age());
    assert_eq!(defaults::name(view), view.name());
}

#[test]
pub fn person_is_bound_to_the_person_table() {
    let registry = common::registry();
    let person = Person::new(&registry, 1, "Cy").unwrap();

    assert!(std::sync::Arc::ptr_eq(registry.person(), person.table()));
}

#[test]
pub fn record_outlives_the_registry() {
    let registry = common::registry();
    let person = Person::new(&registry, 30, "Di").unwrap();
    drop(registry);

    let output = common::capture(|out| person.upcast().greet(out));
    assert_eq!("Hello world, I'm Di!\n", output);

    person.release();
}
