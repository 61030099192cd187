// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
extern crate alloc;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::ops::RangeInclusive;

use arrayvec::ArrayVec;
use mlx90640_frame::common::{EEPROM_WORDS, RAM_WORDS};
use mlx90640_frame::{Address, BusTransport};

const STATUS_REGISTER_ADDRESS: u16 = 0x8000;

// The lowest 6 bits are documented, but the three lowest are read-only.
const STATUS_REGISTER_WRITE_MASK: u16 = 0x0038;

const CONTROL_REGISTER_ONE_ADDRESS: u16 = 0x800D;

// Only the top three bits of control register 1 are reserved.
const CONTROL_REGISTER_1_WRITE_MASK: u16 = 0x1FFF;

/// Power-on value of control register 1, from the datasheet.
pub const DEFAULT_CONTROL_REGISTER: u16 = 0x1901;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MockError {
    /// The given address shouldn't be accessed.
    IllegalAccess(Address),

    /// The given address should not be written to.
    IllegalWriteAddress(Address),

    /// The given value is illegal for the given location.
    IllegalWriteValue(Address, u16),

    /// The given address isn't valid for a device.
    UnknownMemoryAddress(Address),

    /// An unknown I2C address was given.
    UnknownI2cAddress(u8),

    /// The requested operation is not allowed.
    ///
    /// This covers situations such as:
    /// * A read without a register address written first (without a stop condition).
    /// * A register address write that isn't exactly 2 bytes.
    /// * A write with a stop condition that isn't exactly one word (4 bytes with the address).
    /// * Reads that aren't a full number of words (each word is two bytes).
    IllegalOperation,

    /// A failure requested by the test.
    Injected,
}

/// A bus call, as seen by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusOperation {
    Write {
        i2c_address: u8,
        bytes: ArrayVec<u8, 4>,
        send_stop: bool,
    },
    Read {
        i2c_address: u8,
        length: usize,
        send_stop: bool,
    },
}

impl BusOperation {
    pub fn is_write(&self) -> bool {
        matches!(self, BusOperation::Write { .. })
    }

    /// Whether this is a write of a full word (address and value) to `register`.
    pub fn is_word_write_to(&self, register: u16) -> bool {
        match self {
            BusOperation::Write {
                bytes, send_stop, ..
            } => *send_stop && bytes.len() == 4 && bytes[..2] == register.to_be_bytes(),
            _ => false,
        }
    }
}

/// A simulated MLX90640 on an I²C bus.
///
/// Clones share their state, so a test can keep one handle while the camera owns another.
#[derive(Clone, Debug)]
pub struct MockCameraBus {
    i2c_address: u8,
    ram_range: RangeInclusive<u16>,
    eeprom_range: RangeInclusive<u16>,
    eeprom_data: Rc<RefCell<[u16; EEPROM_WORDS]>>,
    ram_data: Rc<RefCell<[u16; RAM_WORDS]>>,
    status_register: Rc<Cell<u16>>,
    control_register: Rc<Cell<u16>>,
    /// The register address written (without a stop) before a read.
    pointer: Rc<Cell<Option<u16>>>,
    /// Keep reporting new data even after the controller clears the flag.
    sticky_new_data: Rc<Cell<bool>>,
    /// Status register reads left before new data is reported.
    polls_until_ready: Rc<Cell<usize>>,
    fail_writes: Rc<Cell<bool>>,
    fail_reads: Rc<Cell<bool>>,
    operations: Rc<RefCell<Vec<BusOperation>>>,
}

impl MockCameraBus {
    pub fn new(
        i2c_address: u8,
        eeprom: &[u16; EEPROM_WORDS],
        ram: &[u16; RAM_WORDS],
        control_register: u16,
        status_register: u16,
    ) -> Self {
        Self {
            i2c_address,
            ram_range: 0x0400..=(0x0400 + RAM_WORDS as u16 - 1),
            eeprom_range: 0x2400..=(0x2400 + EEPROM_WORDS as u16 - 1),
            eeprom_data: Rc::new(RefCell::new(*eeprom)),
            ram_data: Rc::new(RefCell::new(*ram)),
            status_register: Rc::new(Cell::new(status_register)),
            control_register: Rc::new(Cell::new(control_register)),
            pointer: Rc::new(Cell::new(None)),
            sticky_new_data: Rc::new(Cell::new(false)),
            polls_until_ready: Rc::new(Cell::new(0)),
            fail_writes: Rc::new(Cell::new(false)),
            fail_reads: Rc::new(Cell::new(false)),
            operations: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn get(&self, address: u16, destination: &mut [u8]) -> Result<(), MockError> {
        if destination.len() % 2 != 0 || destination.is_empty() {
            // The camera has a word size of 16 bits, so every read should be a multiple of two
            // bytes.
            return Err(MockError::IllegalOperation);
        }
        let word_count = destination.len() / 2;
        let end_address = address as usize + word_count - 1;
        let words: Vec<u16> = if self.ram_range.contains(&address) {
            if end_address > *self.ram_range.end() as usize {
                return Err(MockError::IllegalAccess((end_address as u16).into()));
            }
            let start = (address - self.ram_range.start()) as usize;
            self.ram_data.borrow()[start..(start + word_count)].to_vec()
        } else if self.eeprom_range.contains(&address) {
            if end_address > *self.eeprom_range.end() as usize {
                return Err(MockError::IllegalAccess((end_address as u16).into()));
            }
            let start = (address - self.eeprom_range.start()) as usize;
            self.eeprom_data.borrow()[start..(start + word_count)].to_vec()
        } else {
            // The registers are non-contiguous, so only 1 word can be read at a time.
            if word_count != 1 {
                return Err(MockError::IllegalAccess(address.into()));
            }
            let value = match address {
                STATUS_REGISTER_ADDRESS => self.read_status(),
                CONTROL_REGISTER_ONE_ADDRESS => self.control_register.get(),
                0x0000..=0x03FF => return Err(MockError::IllegalAccess(address.into())),
                _ => return Err(MockError::UnknownMemoryAddress(address.into())),
            };
            alloc::vec![value]
        };
        destination
            .chunks_exact_mut(2)
            .zip(words)
            .for_each(|(bytes, word)| bytes.copy_from_slice(&word.to_be_bytes()));
        Ok(())
    }

    fn read_status(&self) -> u16 {
        let remaining = self.polls_until_ready.get();
        if remaining > 0 {
            self.polls_until_ready.set(remaining - 1);
            if remaining == 1 {
                self.set_data_available(true);
            }
        }
        self.status_register.get()
    }

    fn set(&self, address: u16, new_word: u16) -> Result<(), MockError> {
        let (mask, register) = match address {
            STATUS_REGISTER_ADDRESS => (STATUS_REGISTER_WRITE_MASK, &self.status_register),
            CONTROL_REGISTER_ONE_ADDRESS => (CONTROL_REGISTER_1_WRITE_MASK, &self.control_register),
            // It's in the name, Read-Only Memory
            0x0000..=0x03FF => return Err(MockError::IllegalWriteAddress(address.into())),
            // Only the camera is allowed to write to its RAM, and the calibration data is lost if
            // the EEPROM is overwritten.
            a if self.ram_range.contains(&a) || self.eeprom_range.contains(&a) => {
                return Err(MockError::IllegalWriteAddress(address.into()))
            }
            _ => return Err(MockError::UnknownMemoryAddress(address.into())),
        };
        let existing = register.get();
        // Reserved bits have to be written back unchanged, except for the read-only bits of the
        // status register which the camera ignores.
        if address != STATUS_REGISTER_ADDRESS && (new_word & !mask) != (existing & !mask) {
            return Err(MockError::IllegalWriteValue(address.into(), new_word));
        }
        let mut updated = (existing & !mask) | (new_word & mask);
        if address == STATUS_REGISTER_ADDRESS && self.sticky_new_data.get() {
            updated |= 0x0008;
        }
        register.set(updated);
        Ok(())
    }

    /// Replace the current RAM and status register.
    ///
    /// This is to simulate a new frame of data being made available. This function does *not*
    /// explicitly set the "new data available" flag. The given status register is used as-is.
    pub fn update_frame(&self, ram_data: &[u16; RAM_WORDS], status_register: u16) {
        *self.ram_data.borrow_mut() = *ram_data;
        self.status_register.set(status_register);
    }

    /// Set the "new data available" flag in the status register to a new value.
    pub fn set_data_available(&self, available: bool) {
        let status = self.status_register.get();
        if available {
            self.status_register.set(status | 0x0008);
        } else {
            self.status_register.set(status & !0x0008);
        }
    }

    /// Set which subpage the camera reports as last measured.
    pub fn set_last_subpage(&self, subpage: u16) {
        let status = self.status_register.get();
        self.status_register.set((status & !0x0001) | (subpage & 0x0001));
    }

    /// Report new data only after `polls` reads of the status register.
    pub fn set_data_available_after(&self, polls: usize) {
        self.set_data_available(false);
        self.polls_until_ready.set(polls);
    }

    /// Keep the "new data" flag set no matter what the controller writes.
    pub fn set_sticky_new_data(&self, sticky: bool) {
        self.sticky_new_data.set(sticky);
        if sticky {
            self.set_data_available(true);
        }
    }

    /// Make every following write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Make every following read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn status_register(&self) -> u16 {
        self.status_register.get()
    }

    pub fn control_register(&self) -> u16 {
        self.control_register.get()
    }

    pub fn set_control_register(&self, value: u16) {
        self.control_register.set(value);
    }

    /// Every bus call made so far, oldest first.
    pub fn operations(&self) -> Ref<'_, Vec<BusOperation>> {
        self.operations.borrow()
    }

    pub fn clear_operations(&self) {
        self.operations.borrow_mut().clear()
    }

    fn add_operation(&self, operation: BusOperation) {
        self.operations.borrow_mut().push(operation);
    }
}

impl BusTransport for MockCameraBus {
    type Error = MockError;

    fn write(&mut self, i2c_address: u8, bytes: &[u8], send_stop: bool) -> Result<(), MockError> {
        let mut recorded = ArrayVec::new();
        recorded
            .try_extend_from_slice(bytes)
            .map_err(|_| MockError::IllegalOperation)?;
        self.add_operation(BusOperation::Write {
            i2c_address,
            bytes: recorded,
            send_stop,
        });
        if self.fail_writes.get() {
            return Err(MockError::Injected);
        }
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        if bytes.len() < 2 {
            return Err(MockError::IllegalOperation);
        }
        let address = u16::from_be_bytes([bytes[0], bytes[1]]);
        match (send_stop, bytes.len()) {
            // Setting up a read
            (false, 2) => {
                self.pointer.set(Some(address));
                Ok(())
            }
            // Writing a single word
            (true, 4) => {
                self.pointer.set(None);
                self.set(address, u16::from_be_bytes([bytes[2], bytes[3]]))
            }
            _ => Err(MockError::IllegalOperation),
        }
    }

    fn read(
        &mut self,
        i2c_address: u8,
        buffer: &mut [u8],
        send_stop: bool,
    ) -> Result<(), MockError> {
        self.add_operation(BusOperation::Read {
            i2c_address,
            length: buffer.len(),
            send_stop,
        });
        if self.fail_reads.get() {
            return Err(MockError::Injected);
        }
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        let address = self.pointer.take().ok_or(MockError::IllegalOperation)?;
        if !send_stop {
            return Err(MockError::IllegalOperation);
        }
        self.get(address, buffer)
    }
}

#[cfg(test)]
mod test {
    use mlx90640_frame::common::DEFAULT_ADDRESS;

    use super::*;

    fn blank_mock() -> MockCameraBus {
        MockCameraBus::new(
            DEFAULT_ADDRESS,
            &[0u16; EEPROM_WORDS],
            &[0u16; RAM_WORDS],
            DEFAULT_CONTROL_REGISTER,
            0x0000,
        )
    }

    #[test]
    fn only_status_and_control_registers() {
        let mut mock = blank_mock();
        // The I2C config register isn't simulated
        assert_eq!(
            mock.write(DEFAULT_ADDRESS, &[0x80, 0x0F, 0x00, 0x01], true),
            Err(MockError::UnknownMemoryAddress(Address::new(0x800F)))
        );
        mock.write(DEFAULT_ADDRESS, &[0x80, 0x0F], false).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(
            mock.read(DEFAULT_ADDRESS, &mut buf, true),
            Err(MockError::UnknownMemoryAddress(Address::new(0x800F)))
        );
        mock.write(DEFAULT_ADDRESS, &[0x80, 0x0D, 0x19, 0x00], true).unwrap();
        assert_eq!(mock.control_register(), 0x1900);
    }

    #[test]
    fn status_write_keeps_read_only_bits() {
        let mut mock = blank_mock();
        mock.set_last_subpage(1);
        mock.set_data_available(true);
        mock.write(DEFAULT_ADDRESS, &[0x80, 0x00, 0x00, 0x30], true).unwrap();
        assert_eq!(mock.status_register(), 0x0031);
    }

    #[test]
    fn operations_recorded_in_order() {
        let mut mock = blank_mock();
        let mut buf = [0u8; 4];
        mock.write(DEFAULT_ADDRESS, &[0x24, 0x00], false).unwrap();
        mock.read(DEFAULT_ADDRESS, &mut buf, true).unwrap();
        let operations = mock.operations();
        assert_eq!(operations.len(), 2);
        assert!(operations[0].is_write());
        assert_eq!(
            operations[1],
            BusOperation::Read {
                i2c_address: DEFAULT_ADDRESS,
                length: 4,
                send_stop: true,
            }
        );
    }
}
