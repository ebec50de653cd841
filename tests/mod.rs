/// Integration tests for dataverse-client
///
/// - api: filter compilation, batch encoding, request completion and the client wrappers
/// - common: scripted mock transport shared by the suites
mod api;
mod common;
