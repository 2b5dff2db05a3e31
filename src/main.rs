// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Meshpath: replay a path-editing script against a grid mesh

fn main() -> anyhow::Result<()> {
    meshpath::run()
}
