/// Router Module Index
///
/// Routes are split by the role gate that guards them. The gate is attached as a
/// `route_layer` on the authenticated and admin routers in `create_router`, so a
/// handler lands behind the right check by virtue of the module it is registered in.

/// Routes accessible to anyone (signup, login, reads).
pub mod public;

/// Routes behind the "any authenticated user" gate.
pub mod authenticated;

/// Routes behind the "admin only" gate, nested under `/admin`.
pub mod admin;
