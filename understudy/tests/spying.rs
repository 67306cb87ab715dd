mod test_extensions;

use std::sync::Arc;

use understudy::test_tools::DoubleBuilder;
use understudy::{DefaultAnswer, DoubleSettings, TestDouble, once, times};

use test_extensions::{ListApi, ListDouble, Playlist, VecList, raised_message, registry};

#[test]
fn spy_calls_the_real_instance_unless_stubbed() {
    let registry = registry();
    let spy = registry.spy::<ListDouble>(Box::new(VecList::default()));
    spy.when_size().then_return(100);

    assert!(spy.add("one".to_string()));
    assert!(spy.add("two".to_string()));

    assert_eq!(Some("one".to_string()), spy.get(0));
    assert_eq!(100, spy.size());

    spy.verify_add(once(), "one").unwrap();
    spy.verify_add(once(), "two").unwrap();
}

#[test]
fn stubbing_a_spy_never_calls_the_real_instance() {
    let registry = registry();
    let spy = registry.spy::<ListDouble>(Box::new(VecList::default()));

    spy.when_get(0).then_return(Some("foo".to_string()));

    assert_eq!(Some("foo".to_string()), spy.get(0));
    assert_eq!(None, spy.get(1));
    assert_eq!(2, spy.double().invocations().len());
}

#[test]
fn partial_double_calls_the_real_method_for_one_call_pattern() {
    let registry = registry();
    let spy = registry.spy::<ListDouble>(Box::new(VecList::default()));
    spy.when_add(understudy::any()).then_return(false);
    spy.when_add("123").then_call_real_method().unwrap();

    assert!(spy.add("123".to_string()));
    assert!(!spy.add("456".to_string()));
    assert_eq!(1, spy.size());
}

#[test]
fn calling_the_real_method_requires_a_real_instance() {
    let registry = registry();
    let list: ListDouble = registry.double();

    list.when_add("123")
        .then_call_real_method()
        .expect_err("a pure double has no real method to call");
}

#[test]
fn calls_real_methods_without_real_instance_is_raised() {
    let registry = registry();
    let list: ListDouble = registry.double_with_settings(
        DoubleSettings::default().with_default_answer(DefaultAnswer::CallsRealMethods),
    );

    let message = raised_message(|| list.size()).expect("no real instance to call");
    assert!(
        message.contains("no real instance to delegate to"),
        "unexpected message: {message}"
    );
}

#[test]
fn spy_created_with_explicit_settings() {
    let registry = registry();
    let spy = registry.create::<ListDouble>(
        Some(Box::new(VecList::default())),
        DoubleSettings::default()
            .with_name("spied list")
            .with_default_answer(DefaultAnswer::CallsRealMethods),
    );

    spy.add("one".to_string());

    let details = spy.double().details();
    assert_eq!("spied list", details.name);
    assert!(details.is_spy);
    assert_eq!(1, spy.size());
}

#[test]
fn double_details() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.when_size().then_return(10);
    list.add("1".to_string());

    let details = list.double().details();
    assert_eq!("ListApi", details.capability);
    assert!(!details.is_spy);
    assert_eq!(1, details.stub_rules);
    assert_eq!(1, details.invocations.len());
}

#[test]
fn reset_double() {
    let registry = registry();
    let list: ListDouble = registry.double();
    list.when_size().then_return(10);
    list.add("1".to_string());

    list.double().reset();

    assert_eq!(0, list.size());
    list.verify_add(times(0), "1").unwrap();
    list.verify_size(once()).unwrap();
}

#[test]
fn configured_double_is_injected_into_the_unit_under_test() {
    let registry = registry();
    let titles = DoubleBuilder::<ListDouble>::configure(&registry, |titles| {
        titles.when_get(0).then_return(Some("Intro".to_string()));
        titles.when_size().then_return(1);
    });

    let playlist = Playlist::new(titles.clone());
    assert_eq!("Intro", playlist.now_playing());
    playlist.restart();

    titles.verify_clear(once()).unwrap();
}

#[test]
fn configured_spy_is_injected_into_the_unit_under_test() {
    let registry = registry();
    let titles: Arc<ListDouble> = DoubleBuilder::<ListDouble>::configure_spy(
        &registry,
        Box::new(VecList::default()),
        |titles| {
            titles.when_add("Outro").then_return(false);
        },
    );

    let playlist = Playlist::new(titles.clone());
    assert!(playlist.enqueue("Intro"));
    assert!(!playlist.enqueue("Outro"));
    assert_eq!("Intro", playlist.now_playing());

    titles.verify_add(times(2), understudy::any()).unwrap();
    assert_eq!(1, titles.size());
}
