// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log::debug;
use std::path::PathBuf;
use std::{env, fs};
use xpi_api::{build_manifest_and_signature_file, repack_legacy, Result, XpiError};

/// Signs an add-on in two steps, with the PKCS7 signature made by an
/// external tool in between.
///
/// ```
/// $ xpi-cli manifest ./addon.xpi ./sig
/// $ ls ./sig
/// manifest.mf mozilla.sf
/// $ openssl smime -sign -binary -noattr -outform DER \
///     -in ./sig/mozilla.sf -out ./sig/mozilla.rsa -signer cert.pem -inkey key.pem
/// $ xpi-cli repack ./addon.xpi ./addon-signed.xpi ./sig/manifest.mf ./sig/mozilla.sf ./sig/mozilla.rsa
/// ```
///
/// Set `RUST_LOG=debug` to see which entries were skipped or dropped.
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match parse_command(&args)? {
        Command::Manifest { input, out_dir } => {
            let archive = fs::read(&input)?;
            let (manifest, sig_file) = build_manifest_and_signature_file(&archive)?;

            fs::create_dir_all(&out_dir)?;
            let manifest_path = out_dir.join("manifest.mf");
            let sig_file_path = out_dir.join("mozilla.sf");
            fs::write(&manifest_path, manifest)?;
            println!("Wrote {:?} to disk", manifest_path);
            fs::write(&sig_file_path, sig_file)?;
            println!("Wrote {:?} to disk", sig_file_path);
        }
        Command::Repack {
            input,
            output,
            manifest,
            sig_file,
            signature
        } => {
            let archive = fs::read(&input)?;
            let manifest = fs::read(&manifest)?;
            let sig_file = fs::read(&sig_file)?;
            let signature = fs::read(&signature)?;
            debug!("Embedding {} byte signature", signature.len());

            let signed = repack_legacy(&archive, &manifest, &sig_file, &signature)?;
            fs::write(&output, signed)?;
            println!("Wrote {:?} to disk", output);
            println!("Repacked & signed successfully!");
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
enum Command {
    Manifest {
        input: PathBuf,
        out_dir: PathBuf
    },
    Repack {
        input: PathBuf,
        output: PathBuf,
        manifest: PathBuf,
        sig_file: PathBuf,
        signature: PathBuf
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    let arg = |n: usize, what: &str| -> Result<PathBuf> {
        args.get(n)
            .map(PathBuf::from)
            .ok_or(XpiError::Cli(format!("{what} not provided")))
    };

    match args.first().map(String::as_str) {
        Some("manifest") => Ok(Command::Manifest {
            input: arg(1, "Input XPI path")?,
            out_dir: arg(2, "Output directory")?
        }),
        Some("repack") => Ok(Command::Repack {
            input: arg(1, "Input XPI path")?,
            output: arg(2, "Output XPI path")?,
            manifest: arg(3, "Manifest path")?,
            sig_file: arg(4, "Signature file path")?,
            signature: arg(5, "Signature path")?
        }),
        Some(other) => Err(XpiError::Cli(format!("Unknown command {other:?}"))),
        None => Err(XpiError::Cli(
            "Usage: xpi-cli manifest <in.xpi> <out-dir> | xpi-cli repack <in.xpi> <out.xpi> <manifest.mf> <mozilla.sf> <mozilla.rsa>".into()
        ))
    }
}
