/// CRUD and constraint tests against a live PostgreSQL (skipped with `SKIP_DB_TESTS`)
pub mod crud_tests;
