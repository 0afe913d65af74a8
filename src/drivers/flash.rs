//! Flash page programming through the self-programming interface

use super::{FlashAddress, SelfProgram};
use crate::chip::Chip;
use crate::config::ERASED;

/// Writes `data` to flash starting at `start`, one page at a time.
///
/// Every page the data touches is erased before its first word is loaded,
/// except when `resume` equals `start`: then the previous write stopped in the
/// middle of this page, already erased it, and the write carries on where it
/// left off. An odd final byte is padded with [`ERASED`].
///
/// Returns the address to pass as `resume` to the next write, `None` when the
/// data ended on a page boundary.
pub fn program<C, F>(
    flash: &mut F,
    start: FlashAddress,
    data: &[u8],
    resume: Option<FlashAddress>,
) -> Option<FlashAddress>
where
    C: Chip,
    F: SelfProgram,
{
    if data.is_empty() {
        return resume;
    }

    let words = (data.len() + 1) / 2;
    log::debug!(
        "programming {} words at {:#07x}",
        words,
        start.linear()
    );

    flash.interrupt_free(|flash| {
        flash.wait_idle();

        let mut address = start;
        let mut page_open = resume == Some(start);

        for (i, pair) in data.chunks(2).enumerate() {
            let position = address.word_in_page::<C>();
            if !page_open {
                flash.erase_page(address.page::<C>());
                flash.reenable_read(address);
                page_open = true;
            }

            let low = pair[0];
            let high = pair.get(1).copied().unwrap_or(ERASED);
            flash.load_word(address, u16::from_le_bytes([low, high]));

            let page_full = position == C::PAGE_WORDS - 1;
            if page_full || i + 1 == words {
                flash.commit_page(address.page::<C>());
                flash.reenable_read(address);
            }
            if page_full {
                page_open = false;
            }

            address = address.add(2);
        }

        if address.word_in_page::<C>() == 0 {
            None
        } else {
            Some(address)
        }
    })
}

/// Streams `len` bytes of flash starting at `start` into `sink`.
pub fn read<F, S>(flash: &mut F, start: FlashAddress, len: u16, mut sink: S)
where
    F: SelfProgram,
    S: FnMut(u8),
{
    let mut address = start;
    for _ in 0..len {
        sink(flash.read_byte(address));
        address = address.add(1);
    }
}
