use crate::{image::PicImage, vxor::decode_vxor, Error, Result};

const WIDTH: usize = 288;
const HEIGHT: usize = 128;
const LINE_SIZE: usize = WIDTH / 2;

/// The 288x128 title screen of the TITLE.PIC file, stored vxor-coded with
/// a line width of 144 bytes and no compression.
pub struct Title {
    image: PicImage,
}

impl Title {
    /// Parses the title image from the TITLE.PIC file content.
    pub fn parse(data: &[u8]) -> Result<Title> {
        if data.len() != LINE_SIZE * HEIGHT {
            return Err(Error::Format("unexpected title image size"));
        }
        Ok(Title {
            image: PicImage::new(decode_vxor(data, LINE_SIZE), WIDTH, HEIGHT),
        })
    }

    pub fn image(&self) -> &PicImage {
        &self.image
    }
}
