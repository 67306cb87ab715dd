mod test_extensions;

use understudy::{TestDouble, verify_order};

use test_extensions::{ListApi, ListDouble, registry};

#[test]
fn single_double_calls_in_order() {
    let registry = registry();
    let single: ListDouble = registry.double();
    single.add("was added first".to_string());
    single.add("was added second".to_string());

    let mut in_order = registry.in_order(&[single.double()]);
    in_order.verify(&single.add_call("was added first")).unwrap();
    in_order.verify(&single.add_call("was added second")).unwrap();
}

#[test]
fn several_doubles_calls_in_order() {
    let registry = registry();
    let first: ListDouble = registry.double();
    let second: ListDouble = registry.double();
    first.add("was called first".to_string());
    second.add("was called three".to_string());
    first.add("was called two".to_string());
    second.add("was called four".to_string());

    let mut in_order = registry.in_order(&[first.double(), second.double()]);
    in_order.verify(&first.add_call("was called first")).unwrap();
    in_order.verify(&second.add_call("was called three")).unwrap();
    in_order.verify(&first.add_call("was called two")).unwrap();
    in_order.verify(&second.add_call("was called four")).unwrap();
    in_order.verify_no_more_interactions().unwrap();
}

#[test]
fn in_order_fails_on_calls_in_another_order() {
    let registry = registry();
    let first: ListDouble = registry.double();
    let second: ListDouble = registry.double();
    first.add("one".to_string());
    second.clear();

    let mut in_order = registry.in_order(&[first.double(), second.double()]);
    in_order.verify(&second.clear_call()).unwrap();
    let error = in_order
        .verify(&first.add_call("one"))
        .expect_err("add(one) happened before clear");

    assert!(error.is_verification_failure());
}

#[test]
fn verify_order_finds_increasing_sequences() {
    let registry = registry();
    let x: ListDouble = registry.double();
    let y: ListDouble = registry.double();
    x.size();
    y.size();
    x.size();
    y.size();

    verify_order(&[x.size_call(), y.size_call()]).unwrap();
    verify_order(&[x.size_call(), y.size_call(), x.size_call(), y.size_call()]).unwrap();
    verify_order(&[y.size_call(), x.size_call(), y.size_call(), x.size_call()])
        .expect_err("no x call follows the last y call");
}

#[test]
fn verify_order_fails_when_the_second_call_never_follows() {
    let registry = registry();
    let x: ListDouble = registry.double();
    let y: ListDouble = registry.double();
    x.clear();
    y.clear();

    verify_order(&[x.clear_call(), y.clear_call()]).unwrap();
    let error = verify_order(&[y.clear_call(), x.clear_call()])
        .expect_err("no x call follows a y call");

    let failure = error.verification_failure().unwrap();
    assert_eq!(2, failure.actual.len());
    assert!(
        failure.outcome.contains("ListApi#1.clear()"),
        "unexpected outcome: {}",
        failure.outcome
    );
}
