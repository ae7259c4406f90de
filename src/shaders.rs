use std::fs;
use std::path::Path;

use vulkanalia::bytecode::Bytecode;
use vulkanalia::vk::{DeviceV1_0, HasBuilder};
use vulkanalia::{Device, vk};

use crate::error::ViewError;

/// Reads a compiled shader binary from disk.
pub fn read_shader_file(path: &Path) -> Result<Vec<u8>, ViewError> {
    fs::read(path).map_err(|source| ViewError::ShaderFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks that `code` is well-formed SPIR-V and copies it into the aligned buffer Vulkan expects.
pub fn load_bytecode(path: &Path, code: &[u8]) -> Result<Bytecode, ViewError> {
    Bytecode::new(code).map_err(|e| ViewError::ShaderBytecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Reads the SPIR-V at `path` and wraps it in a shader module.
pub fn create_shader_module(device: &Device, path: &Path) -> Result<vk::ShaderModule, ViewError> {
    let code = read_shader_file(path)?;
    let bytecode = load_bytecode(path, &code)?;

    let create_info = vk::ShaderModuleCreateInfo::builder()
        .code_size(bytecode.code_size())
        .code(bytecode.code());

    unsafe { device.create_shader_module(&create_info, None) }.map_err(ViewError::ShaderModule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vert.spv");

        let err = read_shader_file(&path).unwrap_err();

        assert!(matches!(err, ViewError::ShaderFile { .. }));
        assert!(err.to_string().contains("does the file exist?"));
        assert!(err.to_string().contains("vert.spv"));
    }

    #[test]
    fn test_reads_whole_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x03, 0x02, 0x23, 0x07, 0, 0, 1, 0]).unwrap();

        let code = read_shader_file(file.path()).unwrap();

        assert_eq!(code, vec![0x03, 0x02, 0x23, 0x07, 0, 0, 1, 0]);
    }

    #[test]
    fn test_rejects_truncated_bytecode() {
        let path = Path::new("shaders/frag.spv");
        let Err(err) = load_bytecode(path, &[0x03, 0x02, 0x23]) else {
            panic!("truncated bytecode was accepted");
        };

        assert!(matches!(err, ViewError::ShaderBytecode { .. }));
        assert!(err.to_string().contains("frag.spv"));
    }
}
