//! Binary vector file IO.
//!
//! Format, all values little-endian:
//!
//! ```text
//! [4B magic "CVEC"] [4B version=1]
//! [4B count] [4B dim]
//! count x dim x [4B float32]
//! ```

use std::io::{BufReader, BufWriter, Read, Write};

use crate::error::VecError;

const MAGIC: [u8; 4] = [b'C', b'V', b'E', b'C'];
const VERSION: u32 = 1;

/// Serialize vectors to a writer. All vectors must share one dimension.
pub fn save_vectors(vectors: &[Vec<f32>], w: &mut dyn Write) -> Result<(), VecError> {
    let write_err = |e: std::io::Error| VecError::Io(e.to_string());
    let mut bw = BufWriter::new(w);

    let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
    for v in vectors {
        if v.len() != dim {
            return Err(VecError::DimensionMismatch {
                got: v.len(),
                want: dim,
            });
        }
    }

    bw.write_all(&MAGIC).map_err(write_err)?;
    bw.write_all(&VERSION.to_le_bytes()).map_err(write_err)?;
    bw.write_all(&(vectors.len() as u32).to_le_bytes()).map_err(write_err)?;
    bw.write_all(&(dim as u32).to_le_bytes()).map_err(write_err)?;

    for v in vectors {
        for &x in v {
            bw.write_all(&x.to_le_bytes()).map_err(write_err)?;
        }
    }

    bw.flush().map_err(write_err)?;
    Ok(())
}

/// Deserialize vectors from a reader, validating magic, version, and
/// declared dimensions against the payload.
pub fn load_vectors(r: &mut dyn Read) -> Result<Vec<Vec<f32>>, VecError> {
    let read_err = |e: std::io::Error| VecError::Io(e.to_string());
    let mut br = BufReader::new(r);

    let mut buf4 = [0u8; 4];
    br.read_exact(&mut buf4).map_err(read_err)?;
    if buf4 != MAGIC {
        return Err(VecError::InvalidFormat(format!("invalid magic {buf4:?}")));
    }

    br.read_exact(&mut buf4).map_err(read_err)?;
    let version = u32::from_le_bytes(buf4);
    if version != VERSION {
        return Err(VecError::InvalidFormat(format!(
            "unsupported version {version} (want {VERSION})"
        )));
    }

    br.read_exact(&mut buf4).map_err(read_err)?;
    let count = u32::from_le_bytes(buf4) as usize;
    br.read_exact(&mut buf4).map_err(read_err)?;
    let dim = u32::from_le_bytes(buf4) as usize;

    if count > 0 && dim == 0 {
        return Err(VecError::InvalidFormat("invalid dimension 0".into()));
    }

    let mut vectors = Vec::with_capacity(count);
    for _ in 0..count {
        let mut v = vec![0.0f32; dim];
        for x in &mut v {
            let mut fb = [0u8; 4];
            br.read_exact(&mut fb).map_err(read_err)?;
            *x = f32::from_le_bytes(fb);
        }
        vectors.push(v);
    }

    // Trailing bytes mean the header lied about count/dim.
    let mut probe = [0u8; 1];
    match br.read(&mut probe) {
        Ok(0) => Ok(vectors),
        Ok(_) => Err(VecError::InvalidFormat("trailing data after vectors".into())),
        Err(e) => Err(read_err(e)),
    }
}
