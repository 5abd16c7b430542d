/// Authentication and authorization
///
/// - [`password`]: Argon2id hashing and strength rules
/// - [`jwt`]: HS256 bearer token encoding
/// - [`session`]: sign-in, token resolution and sign-out against the store
/// - [`authorization`]: the role policy every service consults
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::authorization::{authorize, Action, CurrentUser};
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
/// use taskdesk_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Launch#2025")?;
/// assert!(verify_password("Launch#2025", &hash)?);
///
/// let lead = CurrentUser { id: 1, email: "lead@example.com".into(), role: Role::TeamLeader };
/// authorize(Some(&lead), Action::CreateTask)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod password;
pub mod session;
