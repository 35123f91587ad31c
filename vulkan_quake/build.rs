use std::{
    env,
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

fn find_shaders(directory: &Path) -> io::Result<Vec<PathBuf>> {
    fs::read_dir(directory).map(|read_dir| {
        read_dir
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                let extension = path.extension().and_then(OsStr::to_str);
                matches!(extension, Some("frag" | "vert")).then_some(path)
            })
            .collect::<Vec<PathBuf>>()
    })
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(
        env::var_os("OUT_DIR").ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR"))?,
    );
    let shader_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/shaders");
    println!("cargo:rerun-if-changed={}", shader_dir.display());

    for shader in find_shaders(&shader_dir)? {
        println!("cargo:rerun-if-changed={}", shader.display());

        let Some(filename) = shader.file_name().map(OsStr::to_string_lossy) else {
            continue;
        };
        let shader_out = out_dir.join(format!("{filename}.spv"));
        // Bytecode can still be supplied at runtime, so a missing compiler is not fatal
        match Command::new("glslc")
            .arg(&shader)
            .arg("-o")
            .arg(&shader_out)
            .status()
        {
            Ok(status) if status.success() => (),
            Ok(status) => {
                println!(
                    "cargo:warning=glslc failed to compile {}: {status}",
                    shader.display()
                );
            }
            Err(err) => {
                println!("cargo:warning=glslc not available, skipping shader compilation: {err}");
                return Ok(());
            }
        }
    }

    Ok(())
}
