use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Error, Result};

/// MarshalSize returns the size of the wire-marshaled form of a value.
pub trait MarshalSize {
    fn marshal_size(&self) -> usize;
}

/// Marshal writes a value to its wire representation.
pub trait Marshal: MarshalSize {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize>;

    fn marshal(&self) -> Result<Bytes> {
        let l = self.marshal_size();
        let mut buf = BytesMut::with_capacity(l);
        buf.resize(l, 0);
        let n = self.marshal_to(&mut buf)?;
        if n != l {
            Err(Error::UnexpectedMarshalSize(n, l))
        } else {
            Ok(buf.freeze())
        }
    }
}

/// Unmarshal parses a value out of its wire representation. The `Self:
/// Sized` bound on the method (not the trait) is what lets `Unmarshal`
/// still appear in `dyn Packet + Send + Sync` elsewhere in the
/// workspace: it exempts `unmarshal` from the vtable instead of making
/// the whole trait non-object-safe.
pub trait Unmarshal {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf;
}
