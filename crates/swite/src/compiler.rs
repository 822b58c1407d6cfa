// Copyright (c) 2025-2026 Swite and contributors

// SPDX-License-Identifier: MIT
// Third-party contributions licensed under DCO

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NON-INFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

// ----------------------------------------------------------------------------

//! External compiler interfaces.
//!
//! The compiler that turns component sources into browser script, and the
//! code transformer used for TypeScript, are separate tools with their own
//! release cadence. The pipeline consumes them through the narrow traits in
//! this module and knows nothing about their internals.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::result;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Enums
// ----------------------------------------------------------------------------

/// Compilation error.
#[derive(Debug, Error)]
pub enum Error {
    /// The compiler refused the input.
    #[error("compile failed: {0}")]
    Compile(String),

    /// The source could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Compilation result.
pub type Result<T = ()> = result::Result<T, Error>;

// ----------------------------------------------------------------------------

/// Loader for the code transformer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loader {
    /// TypeScript.
    Ts,
    /// TypeScript with JSX.
    Tsx,
}

// ----------------------------------------------------------------------------
// Structs
// ----------------------------------------------------------------------------

/// Options for the code transformer.
#[derive(Clone, Debug)]
pub struct TransformOptions {
    /// Loader to use.
    pub loader: Loader,
    /// Path of the source, for diagnostics.
    pub path: PathBuf,
}

/// Route entry, as enumerated by the route scanner.
#[derive(Clone, Debug, Serialize)]
pub struct RouteEntry {
    /// Route path.
    pub path: String,
    /// Route metadata.
    pub meta: serde_json::Value,
}

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Compiler for component sources.
///
/// Implementations map `.ui` and `.uix` sources to browser script. Calls
/// are stateless - the same input always yields the same output, which is
/// what makes the compilation cache sound.
pub trait Compile: Send + Sync {
    /// Compiles the given source to browser script.
    fn compile(&self, source: &str, path: &Path) -> Result<String>;
}

/// Code transformer for plain typed sources.
///
/// Used for `.ts` sources, which don't pass through the component compiler
/// but still need type stripping before a browser can run them.
pub trait Transform: Send + Sync {
    /// Transforms the given source to browser script.
    fn transform(&self, source: &str, opts: &TransformOptions)
        -> Result<String>;
}

/// Source of route definitions.
///
/// The route scanner enumerates route files and raises change events; the
/// server only consumes the resulting list for the route table endpoint.
pub trait RouteSource: Send + Sync {
    /// Returns all known routes.
    fn routes(&self) -> Vec<RouteEntry>;
}

// ----------------------------------------------------------------------------
// Trait implementations
// ----------------------------------------------------------------------------

impl<F> Compile for F
where
    F: Fn(&str, &Path) -> Result<String> + Send + Sync,
{
    #[inline]
    fn compile(&self, source: &str, path: &Path) -> Result<String> {
        self(source, path)
    }
}

impl<F> Transform for F
where
    F: Fn(&str, &TransformOptions) -> Result<String> + Send + Sync,
{
    #[inline]
    fn transform(
        &self, source: &str, opts: &TransformOptions,
    ) -> Result<String> {
        self(source, opts)
    }
}
