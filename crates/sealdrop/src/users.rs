//! User profile calls.

use sealdrop_core::{Change, Clock, Identity, User};
use sealdrop_store::Store;

use crate::api::{GetUsersResponse, UserData, WhoAmIResponse};
use crate::error::Result;
use crate::exchange::Exchange;

impl<S: Store, C: Clock> Exchange<S, C> {
    /// Create or replace the caller's profile.
    pub async fn set_user(&self, caller: &Identity, user: User) -> Result<()> {
        let mut ledger = self.lock().await;
        let replaced = ledger.users().contains(caller);

        self.commit(
            &mut ledger,
            Change::UserSet {
                identity: caller.clone(),
                user,
            },
        )
        .await?;

        tracing::info!(caller = %caller, replaced, "user set");
        Ok(())
    }

    pub async fn who_am_i(&self, caller: &Identity) -> WhoAmIResponse {
        let ledger = self.lock().await;
        match ledger.users().get(caller) {
            Some(user) => WhoAmIResponse::KnownUser {
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
            },
            None => WhoAmIResponse::UnknownUser,
        }
    }

    /// Every registered profile, in identity order. Only registered callers
    /// may list users.
    pub async fn get_users(&self, caller: &Identity) -> GetUsersResponse {
        let ledger = self.lock().await;
        if !ledger.users().contains(caller) {
            tracing::debug!(caller = %caller, "get_users refused: caller has no profile");
            return GetUsersResponse::PermissionError;
        }

        GetUsersResponse::Users(
            ledger
                .users()
                .iter()
                .map(|(identity, user)| UserData::new(identity.clone(), user))
                .collect(),
        )
    }
}
