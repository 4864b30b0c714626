#![doc = "drive-notion-sync: markdown documents from a Drive folder, as native Notion blocks."]

//! The heart of the crate is [`convert`]: a pure function from a markdown document tree
//! ([`mdast`]) to an ordered list of target [`block::Block`]s. Everything else is the
//! boundary around it:
//! - [`batch`] sends blocks in bounded, ordered chunks and replaces page content
//! - [`contract`] defines the remote services; [`drive`] and [`notion`] implement them
//! - [`synchronise`] decides create / update / skip per file
//! - [`config`], [`load_config`] and [`cli`] wire it up for the binary

pub mod annotations;
pub mod batch;
pub mod block;
pub mod cli;
pub mod config;
pub mod contract;
pub mod convert;
pub mod drive;
pub mod load_config;
pub mod mdast;
pub mod notion;
pub mod synchronise;
