use uuid::Uuid;

use crate::error::AppError;

/// Records with an owning user. `None` means the owner link is gone.
pub trait Owned {
    fn owner_id(&self) -> Option<Uuid>;
}

/// Owner-or-not-found policy: a record the caller does not own is reported
/// exactly like a missing one, so ids of other users' records cannot be probed.
pub fn owned_or_not_found<T: Owned>(
    record: Option<T>,
    caller: Uuid,
    what: &'static str,
) -> Result<T, AppError> {
    match record {
        Some(r) if r.owner_id() == Some(caller) => Ok(r),
        _ => Err(AppError::NotFound(what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Thing(Option<Uuid>);

    impl Owned for Thing {
        fn owner_id(&self) -> Option<Uuid> {
            self.0
        }
    }

    #[test]
    fn owner_gets_record() {
        let me = Uuid::new_v4();
        assert!(owned_or_not_found(Some(Thing(Some(me))), me, "Thing").is_ok());
    }

    #[test]
    fn mismatch_and_missing_are_indistinguishable() {
        let me = Uuid::new_v4();
        let other = owned_or_not_found(Some(Thing(Some(Uuid::new_v4()))), me, "Thing").unwrap_err();
        let missing = owned_or_not_found(None::<Thing>, me, "Thing").unwrap_err();
        assert_eq!(other.to_string(), missing.to_string());
        assert_eq!(other.status_code(), missing.status_code());
    }

    #[test]
    fn orphaned_record_is_not_found() {
        let me = Uuid::new_v4();
        assert!(owned_or_not_found(Some(Thing(None)), me, "Thing").is_err());
    }
}
