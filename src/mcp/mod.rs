//! MCP Server module for exposing Meraki tooling to AI assistants.
//!
//! This module provides an MCP (Model Context Protocol) server that exposes
//! the management API accessors and the diagnostic workflows for integration
//! with tools like Claude Desktop, Cursor, and VS Code.

pub mod server;

pub use server::MerakiServer;
