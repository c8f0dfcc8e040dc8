pub mod file_fetcher;
