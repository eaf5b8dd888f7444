pub trait Serializer {
    fn write_bytes(&mut self, data: &[u8]);
}

#[derive(Default)]
pub struct DynamicSerializer {
    buffer: Vec<u8>,
}

impl DynamicSerializer {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl Serializer for DynamicSerializer {
    fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }
}
