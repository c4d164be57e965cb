/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to all users (anonymous or logged-in): registration,
/// login/logout, and the approved-user listing.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session cookie.
pub mod authenticated;

/// Routes restricted exclusively to users whose stored role is 'admin'.
/// The role check runs inside every handler after authentication.
pub mod admin;
