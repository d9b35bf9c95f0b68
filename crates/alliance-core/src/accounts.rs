//! Profile bootstrap for authenticated users.

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::store::Store;
use crate::types::Profile;

/// Loads a user's profile, creating the default student profile on first use.
pub async fn ensure_profile(
    store: &dyn Store,
    user_id: Uuid,
    email: Option<&str>,
) -> Result<Profile> {
    if let Some(profile) = store.profile(user_id).await? {
        return Ok(profile);
    }

    let profile = Profile::new_student(user_id, email.map(str::to_owned));
    store.insert_profile(&profile).await?;
    info!(%user_id, "Created student profile");

    // Another request may have created it first; the stored row wins.
    Ok(store.profile(user_id).await?.unwrap_or(profile))
}
