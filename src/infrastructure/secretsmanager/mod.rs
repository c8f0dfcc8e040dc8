pub mod secret_retriever;
