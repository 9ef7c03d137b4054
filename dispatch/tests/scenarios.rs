use dispatch::{
    allocation::{Allocate, FailAfter, FaultInjector, Heap, Policy},
    demo::{self, DemoConfig, Outcome},
    person::Person,
    student::Student,
};

mod common;

fn run(policy: &Policy, config: &DemoConfig) -> (Outcome, String) {
    let mut buffer = Vec::new();
    let outcome = demo::run(policy, config, &mut buffer).unwrap();

    (outcome, String::from_utf8(buffer).unwrap())
}

#[test]
pub fn default_demonstration() {
    let (outcome, output) = run(&Policy::default(), &DemoConfig::default());

    assert_eq!(Outcome::Completed, outcome);
    assert_eq!(0, outcome.exit_code());
    assert_eq!(
        "Hello world, I'm Liam!\nI am 19 years old, and doing Well in class!\n",
        output
    );
}

#[test]
pub fn demonstration_with_gpa_report() {
    let config = DemoConfig {
        name: "Ann".to_string(),
        age: 20,
        gpa: 2.0,
        report_gpa: true,
        ..DemoConfig::default()
    };

    let (outcome, output) = run(&Policy::default(), &config);

    assert_eq!(Outcome::Completed, outcome);
    assert_eq!(
        "Hello world, I'm Ann!\nI am 20 years old, and doing Poorly in class!\nAnn's GPA is 2.00\n",
        output
    );
}

#[test]
pub fn demonstration_with_layout() {
    let config = DemoConfig {
        show_layout: true,
        ..DemoConfig::default()
    };

    let (_, output) = run(&Policy::default(), &config);

    assert!(output.starts_with(
        "person [release*, greet*, describe*, grow*, get_age*, get_name*]\nstudent [release, greet, describe*, grow, get_age, get_name, get_gpa*]\n"
    ));
    assert!(output.ends_with("doing Well in class!\n"));
}

#[test]
pub fn construction_failure_exits_with_one() {
    let (outcome, output) = run(
        &Policy::FailAfter(FailAfter::exhausted()),
        &DemoConfig::default(),
    );

    let Outcome::ConstructionFailed(error) = &outcome else {
        panic!("expected the construction to fail");
    };
    assert!(error.type_name().ends_with("Student"));
    assert_eq!(size_of::<Student>(), error.size());
    assert_eq!(1, outcome.exit_code());
    assert_eq!("", output);
}

#[test]
pub fn constructors_report_allocation_failure() {
    let registry = common::registry();
    let allocator = FailAfter::exhausted();

    assert!(Person::new_in(&registry, &allocator, 1, "A").is_err());
    assert!(Student::new_in(&registry, &allocator, 1, "A", 1.0).is_err());
}

#[test]
pub fn fail_after_counts_successes() {
    let registry = common::registry();
    let allocator = FailAfter::new(2);

    let first = Person::new_in(&registry, &allocator, 1, "A");
    let second = Student::new_in(&registry, &allocator, 2, "B", 3.0);
    let third = Person::new_in(&registry, &allocator, 3, "C");

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(third.is_err());
}

#[test]
pub fn fault_injector_extremes() {
    let never = FaultInjector::new(0.0, 7);
    let always = FaultInjector::new(1.0, 7);

    for _ in 0..32 {
        assert!(never.allocate(1_u64).is_ok());
        assert!(always.allocate(1_u64).is_err());
    }
}

#[test]
pub fn fault_injector_replays_with_the_same_seed() {
    let first = FaultInjector::new(0.5, 42);
    let second = FaultInjector::new(0.5, 42);

    let first_run = (0..64)
        .map(|i| first.allocate(i).is_ok())
        .collect::<Vec<_>>();
    let second_run = (0..64)
        .map(|i| second.allocate(i).is_ok())
        .collect::<Vec<_>>();

    assert_eq!(first_run, second_run);
}

#[test]
pub fn fault_injector_clamps_the_rate() {
    assert!((FaultInjector::new(3.0, 0).rate() - 1.0).abs() < f64::EPSILON);
    assert!(FaultInjector::new(-1.0, 0).rate().abs() < f64::EPSILON);
    assert!(FaultInjector::new(f64::NAN, 0).rate().abs() < f64::EPSILON);
}

#[test]
pub fn heap_moves_the_value() {
    let boxed = Heap.allocate(String::from("kept")).unwrap();
    assert_eq!("kept", *boxed);

    assert!(Heap.allocate(()).is_ok());
}
