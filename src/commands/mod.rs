/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `topics` — List class levels and curriculum topics
- `study`  — Interactive study session (chat, summaries, quizzes)

These handlers are intentionally small and use the library components:
the backend client and the session engine.
*/

pub mod study;
pub mod topics;
