//! AI-assisted git commit message and pull request title generation.
//!
//! `lazycommit` inspects the local working copy, extracts a diff via the
//! `git` binary, and asks an LLM chat-completion backend for candidate
//! commit messages or pull request titles. Several interchangeable
//! backends are supported; the GitHub Copilot backend exchanges a
//! long-lived GitHub credential for a short-lived bearer token and caches
//! it across invocations (see [`auth`]).

pub mod auth;
pub mod commands;
pub mod config;
pub mod git;
pub mod prompts;
pub mod providers;
