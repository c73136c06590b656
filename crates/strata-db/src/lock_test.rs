use super::*;
use crate::test_support::RecordingSession;

#[test]
fn test_release_unlocks_once() {
    let mut session = RecordingSession::default();
    let lock = AdvisoryLock::acquire(&mut session).unwrap();
    lock.release().unwrap();

    assert_eq!(
        session.calls,
        vec![format!("lock {LOCK_KEY}"), format!("unlock {LOCK_KEY}")]
    );
}

#[test]
fn test_drop_unlocks() {
    let mut session = RecordingSession::default();
    {
        let mut lock = AdvisoryLock::acquire_key(&mut session, 7).unwrap();
        lock.execute_batch("select 1").unwrap();
    }
    assert_eq!(session.calls, vec!["lock 7", "select 1", "unlock 7"]);
}

#[test]
fn test_release_reports_unlock_failure() {
    let mut session = RecordingSession {
        fail_unlock: true,
        ..RecordingSession::default()
    };
    let lock = AdvisoryLock::acquire(&mut session).unwrap();
    assert!(lock.release().is_err());
    assert_eq!(session.calls.len(), 2);
}

#[test]
fn test_failed_acquire_does_not_unlock() {
    let mut session = RecordingSession {
        fail_lock: true,
        ..RecordingSession::default()
    };
    assert!(AdvisoryLock::acquire(&mut session).is_err());
    assert!(session.calls.is_empty());
}
