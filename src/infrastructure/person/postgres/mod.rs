pub mod postgres_repository;
