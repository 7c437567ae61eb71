use super::*;

#[test]
fn test_echo_backspaces_are_swallowed_exactly() {
    let mut session = SubstitutionSession::new(make_hu_table());
    type_string(&mut session, "h");
    let resp = session.handle_key(KeyEvent::Character('u'));
    let n = resp.correction.unwrap().delete_count;
    assert_eq!(n, 2);

    // Echo of the first commit (1) plus this one (2).
    assert_eq!(session.pending_echo_backspaces(), 3);
    for left in (0..3).rev() {
        let resp = session.handle_key(KeyEvent::Backspace);
        assert!(resp.consumed, "echo backspace must be swallowed");
        assert_eq!(session.pending_echo_backspaces(), left);
        assert_eq!(session.buffer(), "hu", "echo must not touch the buffer");
    }

    // The next one is the user's.
    let resp = session.handle_key(KeyEvent::Backspace);
    assert!(!resp.consumed);
    assert_eq!(session.buffer(), "");
    assert_eq!(session.pending_echo_backspaces(), 0);
}

#[test]
fn test_echo_interleaved_with_typing() {
    let mut session = SubstitutionSession::new(make_hu_table());
    // Commit h, its echo arrives, then u extends.
    session.handle_key(KeyEvent::Character('h'));
    assert!(session.handle_key(KeyEvent::Backspace).consumed);
    assert!(!session.handle_key(KeyEvent::Character('ሀ')).consumed);
    assert_eq!(session.buffer(), "h");

    let resp = session.handle_key(KeyEvent::Character('u'));
    assert_eq!(resp.correction.unwrap().delete_count, 2);
    assert!(session.handle_key(KeyEvent::Backspace).consumed);
    assert!(session.handle_key(KeyEvent::Backspace).consumed);
    session.handle_key(KeyEvent::Character('ሁ'));
    assert_eq!(session.pending_echo_backspaces(), 0);
    assert_eq!(session.buffer(), "hu");
}

#[test]
fn test_commit_ids_increase() {
    let mut session = SubstitutionSession::new(make_hu_table());
    let responses = type_string(&mut session, "hhu");
    let ids: Vec<_> = responses
        .iter()
        .filter_map(|r| r.correction.as_ref().map(|c| c.commit))
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_injection_failure_retracts_undelivered_echoes() {
    let mut session = SubstitutionSession::new(make_hu_table());
    session.handle_key(KeyEvent::Character('h'));
    let resp = session.handle_key(KeyEvent::Character('u'));
    let c = resp.correction.unwrap();
    assert_eq!(session.pending_echo_backspaces(), 3);

    // Only one of the two backspaces for "hu" made it out.
    session.injection_failed(c.commit, 1);
    assert_eq!(session.pending_echo_backspaces(), 2);
    // The buffer is not rolled back.
    assert_eq!(session.buffer(), "hu");

    assert!(session.handle_key(KeyEvent::Backspace).consumed);
    assert!(session.handle_key(KeyEvent::Backspace).consumed);
    assert!(!session.handle_key(KeyEvent::Backspace).consumed);
}

#[test]
fn test_inactive_backspace_does_not_drain_echo() {
    let mut session = SubstitutionSession::new(make_hu_table());
    session.handle_key(KeyEvent::Character('h'));
    session.toggle();
    assert!(!session.handle_key(KeyEvent::Backspace).consumed);
    assert_eq!(session.pending_echo_backspaces(), 1);
    session.toggle();
    assert!(session.handle_key(KeyEvent::Backspace).consumed);
}
