pub mod extraction_api;
