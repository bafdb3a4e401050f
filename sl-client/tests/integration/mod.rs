mod blocking_test;
mod columnar_test;
mod metadata_test;
mod query_test;
mod session_test;
