mod test_extensions;

use understudy::{
    ArgumentCaptor, TestDouble, at_least, at_least_once, at_most, ignore_stubs, never, once,
    times, verify_count, verify_no_more_interactions, verify_zero_interactions,
};

use test_extensions::{ListApi, ListDouble, registry};

#[test]
fn verify_behaviour() {
    let registry = registry();
    let list: ListDouble = registry.double();

    list.add("one".to_string());
    list.clear();

    list.verify_add(once(), "one").unwrap();
    list.verify_clear(once()).unwrap();
}

#[test]
fn verifying_exact_number_of_invocations() {
    let registry = registry();
    let list: ListDouble = registry.double();

    list.add("once".to_string());
    list.verify_add(once(), "once").unwrap();
    list.verify_add(times(1), "once").unwrap();

    list.add("twice".to_string());
    list.add("twice".to_string());
    list.verify_add(times(2), "twice").unwrap();

    for _ in 0..3 {
        list.add("three times".to_string());
    }
    list.verify_add(times(3), "three times").unwrap();
    list.verify_add(never(), "never happened").unwrap();
    list.verify_add(at_least_once(), "three times").unwrap();
    list.verify_add(at_least(2), "three times").unwrap();
    list.verify_add(at_most(5), "three times").unwrap();

    list.verify_add(at_most(2), "three times")
        .expect_err("invoked three times");
}

#[test]
fn failure_reports_expected_and_actual_invocations() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.add("one".to_string());
    list.add("two".to_string());

    let error = list
        .verify_add(times(2), "one")
        .expect_err("add(one) was invoked once");

    let message = error.to_string();
    assert!(
        message.contains(r#"expected: ListApi#1.add("one") to be invoked exactly 2 times"#),
        "unexpected message: {message}"
    );
    assert!(message.contains("but: invoked 1 time"), "unexpected message: {message}");
    assert!(message.contains(r#"ListApi#1.add("two") #2"#), "unexpected message: {message}");
}

#[test]
fn failed_verification_can_be_retried() {
    let registry = registry();
    let list: ListDouble = registry.double();

    list.verify_size(once()).expect_err("size was not invoked yet");
    list.size();
    list.verify_size(once()).unwrap();
}

#[test]
fn verify_count_on_the_untyped_api() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.get(3);

    verify_count(
        list.double(),
        "get",
        &[understudy::eq(3_usize).into_inner()],
        times(1),
    )
    .unwrap();
}

#[test]
fn verify_zero_interactions_on_untouched_doubles() {
    let registry = registry();
    let list_two: ListDouble = registry.double();
    let list_three: ListDouble = registry.double();

    verify_zero_interactions(&[list_two.double(), list_three.double()]).unwrap();

    list_three.size();
    verify_zero_interactions(&[list_two.double(), list_three.double()])
        .expect_err("list_three was called");
}

#[test]
fn find_redundant_invocations() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.add("one".to_string());
    list.add("two".to_string());

    list.verify_add(once(), "one").unwrap();
    let error = verify_no_more_interactions(&[list.double()])
        .expect_err("add(two) was not verified");

    let failure = error.verification_failure().unwrap();
    assert_eq!(1, failure.actual.len());
    assert_eq!("add", failure.actual[0].method);
}

#[test]
fn ignore_stubs_before_checking_for_more_interactions() {
    let registry = registry();
    let list: ListDouble = registry.double();
    let other: ListDouble = registry.double();
    list.when_get(0).then_return(Some("first".to_string()));
    other.when_size().then_return(2);

    list.get(0);
    other.size();
    list.add("one".to_string());
    list.verify_add(once(), "one").unwrap();

    verify_no_more_interactions(&[list.double(), other.double()])
        .expect_err("stubbed calls were not verified");
    verify_no_more_interactions(&ignore_stubs(&[list.double(), other.double()])).unwrap();
}

#[test]
fn capturing_arguments_for_further_assertions() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.add("123".to_string());

    let argument = ArgumentCaptor::<String>::new();
    list.verify_add(once(), argument.capture()).unwrap();

    assert_eq!(Some("123".to_string()), argument.value());
}

#[test]
fn captor_keeps_every_verified_value() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.get(1);
    list.get(2);

    let index = ArgumentCaptor::<usize>::new();
    list.verify_get(times(2), index.capture()).unwrap();

    assert_eq!(vec![1, 2], index.all_values());
    assert_eq!(Some(2), index.value());
}

#[test]
fn calls_from_several_threads_are_all_recorded() {
    let registry = registry();
    let list: ListDouble = registry.double();

    std::thread::scope(|scope| {
        for thread in 0..4 {
            let list = &list;
            scope.spawn(move || {
                for index in 0..25 {
                    list.get(thread * 100 + index);
                }
            });
        }
    });

    list.verify_get(times(100), understudy::any()).unwrap();
    let sequences: Vec<_> = list
        .double()
        .invocations()
        .iter()
        .map(|r| r.sequence)
        .collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
}
