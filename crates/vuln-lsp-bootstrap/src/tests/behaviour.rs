//! Behavioural tests for session bootstrap using `rstest-bdd`.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use vuln_lsp_config::IntegrationConfig;

use crate::capability::CapabilityKind;
use crate::errors::SessionError;
use crate::session::SessionState;
use crate::tests::support::{StartBehaviour, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

#[given("the vulnerability integration")]
fn given_vuln_integration(world: &RefCell<TestWorld>) {
    *world.borrow_mut() = TestWorld::new(IntegrationConfig::vuln_lsp(), StartBehaviour::Running);
}

#[given("the vulnerability integration with a missing backend")]
fn given_missing_backend(world: &RefCell<TestWorld>) {
    *world.borrow_mut() = TestWorld::new(IntegrationConfig::vuln_lsp(), StartBehaviour::Fail);
}

#[given("the vulnerability integration with a slow backend")]
fn given_slow_backend(world: &RefCell<TestWorld>) {
    *world.borrow_mut() = TestWorld::new(IntegrationConfig::vuln_lsp(), StartBehaviour::Pending);
}

#[given("the IQ integration")]
fn given_iq_integration(world: &RefCell<TestWorld>) {
    *world.borrow_mut() = TestWorld::new(IntegrationConfig::iq_lsp(), StartBehaviour::Running);
}

#[when("\"{path}\" is opened in scope \"{scope}\"")]
fn when_opened(world: &RefCell<TestWorld>, path: String, scope: String) {
    world.borrow_mut().open(&scope, &path);
}

#[when("scope \"{scope}\" is closed")]
fn when_scope_closed(world: &RefCell<TestWorld>, scope: String) {
    world.borrow_mut().close(&scope);
}

#[when("the pending handshake in scope \"{scope}\" fails")]
fn when_handshake_fails(world: &RefCell<TestWorld>, scope: String) {
    world.borrow_mut().fail_handshake(&scope);
}

#[when("the backend becomes available")]
fn when_backend_available(world: &RefCell<TestWorld>) {
    world
        .borrow()
        .transport
        .set_default(StartBehaviour::Running);
}

#[then("no backend start was requested")]
fn then_no_start(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().transport.start_count(), 0);
}

#[then("one backend start was requested")]
fn then_one_start(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().transport.start_count(), 1);
}

#[then("two backend starts were requested")]
fn then_two_starts(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let starts = world.transport.starts();
    assert_eq!(starts.len(), 2);
    assert_ne!(starts[0].session, starts[1].session);
}

#[then("one backend stop was requested")]
fn then_one_stop(world: &RefCell<TestWorld>) {
    assert_eq!(world.borrow().transport.stops().len(), 1);
}

#[then("the backend was launched with \"{args}\"")]
fn then_launched_with(world: &RefCell<TestWorld>, args: String) {
    let starts = world.borrow().transport.starts();
    let request = starts.first().expect("start request missing");
    assert_eq!(request.launch.args.join(" "), args);
}

#[then("diagnostics are enabled and go-to-definition is disabled")]
fn then_default_capabilities(world: &RefCell<TestWorld>) {
    let starts = world.borrow().transport.starts();
    let capabilities = &starts.first().expect("start request missing").capabilities;
    assert!(capabilities.is_enabled(CapabilityKind::Diagnostics));
    assert!(!capabilities.is_enabled(CapabilityKind::GoToDefinition));
}

#[then("completion is enabled for the started session")]
fn then_completion_enabled(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let handle = world
        .opened
        .last()
        .and_then(Option::as_ref)
        .expect("session handle missing");
    assert!(handle.require(CapabilityKind::Completion).is_ok());
}

#[then("scope \"{scope}\" is running")]
fn then_running(world: &RefCell<TestWorld>, scope: String) {
    assert_eq!(world.borrow().state(&scope), SessionState::Running);
}

#[then("scope \"{scope}\" is failed")]
fn then_failed(world: &RefCell<TestWorld>, scope: String) {
    assert_eq!(world.borrow().state(&scope), SessionState::Failed);
}

#[then("scope \"{scope}\" is unstarted")]
fn then_unstarted(world: &RefCell<TestWorld>, scope: String) {
    assert_eq!(world.borrow().state(&scope), SessionState::Unstarted);
}

#[then("\"{first}\" and \"{second}\" share a session in scope \"{scope}\"")]
fn then_share_session(
    world: &RefCell<TestWorld>,
    first: String,
    second: String,
    scope: String,
) {
    let world = world.borrow();
    let first = world
        .session_for(&scope, &first)
        .expect("first document session");
    let second = world
        .session_for(&scope, &second)
        .expect("second document session");
    assert_eq!(first, second);
    assert_eq!(world.integration.manager().state_of(first), SessionState::Running);
}

#[then("\"{path}\" has no session in scope \"{scope}\"")]
fn then_no_session(world: &RefCell<TestWorld>, path: String, scope: String) {
    assert!(world.borrow().session_for(&scope, &path).is_none());
}

#[then("a start failure naming \"{executable}\" is reported")]
fn then_start_failure(world: &RefCell<TestWorld>, executable: String) {
    match &world.borrow().last_error {
        Some(SessionError::StartFailed {
            executable: reported,
            ..
        }) => assert_eq!(reported, &executable),
        other => panic!("expected start failure, got {other:?}"),
    }
}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "Opening a POM starts the vulnerability backend"
)]
fn pom_starts_backend(#[from(world)] _: RefCell<TestWorld>) {}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "Non-XML documents are ignored"
)]
fn non_xml_ignored(#[from(world)] _: RefCell<TestWorld>) {}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "Documents in one scope share a session"
)]
fn documents_share_session(#[from(world)] _: RefCell<TestWorld>) {}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "A missing backend is reported and retried"
)]
fn missing_backend_retried(#[from(world)] _: RefCell<TestWorld>) {}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "Closing a scope terminates its session"
)]
fn closing_scope_terminates(#[from(world)] _: RefCell<TestWorld>) {}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "The IQ integration opts into completion"
)]
fn iq_opts_into_completion(#[from(world)] _: RefCell<TestWorld>) {}

#[scenario(
    path = "tests/features/session_bootstrap.feature",
    name = "A replacement session takes over earlier documents"
)]
fn replacement_session_takes_over(#[from(world)] _: RefCell<TestWorld>) {}
