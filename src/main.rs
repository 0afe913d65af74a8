#![no_std]
#![no_main]

use panic_halt as _;

use atmega_boot::bootloader::entry::signal_entry;
use atmega_boot::bootloader::{Bootloader, EntryController, EntryPins, UartSelect};
use atmega_boot::config::{self, Target, ENTRY_POLICY, RECEIVE_BUDGET};
use atmega_boot::drivers::{FlashAddress, SelfProgram};
use atmega_boot::hal::uart::UsartRegisters;
use atmega_boot::hal::{board, BoardMonitor, BusyDelay, Nvm, ResetVector, Usart, Usart0};
use atmega_boot::protocol::SerialTransport;

type Controller = EntryController<Target, ResetVector>;

#[avr_device::entry]
fn main() -> ! {
    let mut nvm = Nvm::new();
    let app_first_byte = SelfProgram::read_byte(&mut nvm, FlashAddress::from_word(config::APP_START, false));

    let mut controller = Controller::new(ResetVector);
    let uart = controller.power_up(app_first_byte, entry_pins(), ENTRY_POLICY);

    let mut led = board::Led::output();
    signal_entry::<Target, _, _>(&mut led, &mut BusyDelay, uart);

    open(uart, nvm, led, &mut controller)
}

#[cfg(avr_chip = "atmega128")]
fn entry_pins() -> EntryPins {
    let uart0 = board::Entry0::pull_up();
    let uart1 = board::Entry1::pull_up();
    avr_device::asm::nop();
    EntryPins::sample(&uart0, &uart1)
}

#[cfg(not(avr_chip = "atmega128"))]
fn entry_pins() -> EntryPins {
    let pin = board::Entry0::pull_up();
    avr_device::asm::nop();
    EntryPins::single(&pin)
}

#[cfg(avr_chip = "atmega128")]
fn open(uart: UartSelect, nvm: Nvm, led: board::Led, controller: &mut Controller) -> ! {
    use atmega_boot::hal::Usart1;

    match uart {
        UartSelect::Uart0 => serve(Usart::<Usart0>::new(), nvm, led, controller),
        UartSelect::Uart1 => serve(Usart::<Usart1>::new(), nvm, led, controller),
    }
}

#[cfg(not(avr_chip = "atmega128"))]
fn open(_uart: UartSelect, nvm: Nvm, led: board::Led, controller: &mut Controller) -> ! {
    serve(Usart::<Usart0>::new(), nvm, led, controller)
}

fn serve<U: UsartRegisters>(usart: Usart<U>, nvm: Nvm, led: board::Led, controller: &mut Controller) -> ! {
    let mut transport = SerialTransport::new(usart, RECEIVE_BUDGET);
    #[cfg(feature = "bt-module")]
    atmega_boot::protocol::transport::announce(&mut transport, config::BT_MODULE_SETUP);

    let mut bootloader =
        Bootloader::<Target, _, _>::new(transport, nvm).with_monitor(BoardMonitor::new(led));
    let exit = bootloader.run();
    controller.leave(exit)
}
