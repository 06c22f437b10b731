//! GitHub as a package registry.
//!
//! Versions are git tags, manifests are `elm-package.json` files read at a
//! ref, and package contents are the zip archives GitHub serves for a ref.
//! [`source::GithubSource`] answers the resolver's questions over HTTP;
//! [`install::Installer`] unpacks resolved packages into `elm-stuff/packages/`.

pub mod archive;
pub mod cache;
pub mod download;
pub mod install;
pub mod repository;
pub mod source;
