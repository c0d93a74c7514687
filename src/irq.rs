//! Interrupt line numbering.

/// A peripheral interrupt line, by NVIC ordinal.
///
/// Any ordinal can be named; the controller rejects the ones the chip does
/// not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct InterruptLine(u16);

impl InterruptLine {
    pub const fn new(number: u16) -> Self {InterruptLine(number)}
    pub const fn number(self) -> u16 {self.0}

    /// Set/clear bank holding this line, and its bit within the bank.
    pub const fn bank(self) -> (u8, u32) {
        ((self.0 / 32) as u8, 1 << (self.0 % 32))
    }

    /// Priority register holding this line, and the slot within it.
    pub const fn priority_slot(self) -> (u8, u32) {
        ((self.0 / 4) as u8, (self.0 % 4) as u32)
    }
}

impl From<InterruptLine> for u16 {
    fn from(line: InterruptLine) -> u16 {line.0}
}

#[cfg(feature = "cpu_tm4c123")]
pub const NUM_INTERRUPTS: usize = 139;

#[cfg(not(feature = "cpu_tm4c123"))]
pub const NUM_INTERRUPTS: usize = crate::regs::MAX_LINES;

/// TM4C123GH6PM interrupt assignments.
#[cfg(feature = "cpu_tm4c123")]
pub mod tm4c123 {
    use super::InterruptLine as L;

    pub const GPIOA        : L = L::new(0);
    pub const GPIOB        : L = L::new(1);
    pub const GPIOC        : L = L::new(2);
    pub const GPIOD        : L = L::new(3);
    pub const GPIOE        : L = L::new(4);
    pub const UART0        : L = L::new(5);
    pub const UART1        : L = L::new(6);
    pub const SSI0         : L = L::new(7);
    pub const I2C0         : L = L::new(8);
    pub const PWM0_FAULT   : L = L::new(9);
    pub const PWM0_0       : L = L::new(10);
    pub const PWM0_1       : L = L::new(11);
    pub const PWM0_2       : L = L::new(12);
    pub const QEI0         : L = L::new(13);
    pub const ADC0SS0      : L = L::new(14);
    pub const ADC0SS1      : L = L::new(15);
    pub const ADC0SS2      : L = L::new(16);
    pub const ADC0SS3      : L = L::new(17);
    pub const WATCHDOG     : L = L::new(18);
    pub const TIMER0A      : L = L::new(19);
    pub const TIMER0B      : L = L::new(20);
    pub const TIMER1A      : L = L::new(21);
    pub const TIMER1B      : L = L::new(22);
    pub const TIMER2A      : L = L::new(23);
    pub const TIMER2B      : L = L::new(24);
    pub const COMP0        : L = L::new(25);
    pub const COMP1        : L = L::new(26);
    pub const SYSCTL       : L = L::new(28);
    pub const FLASH        : L = L::new(29);
    pub const GPIOF        : L = L::new(30);
    pub const UART2        : L = L::new(33);
    pub const SSI1         : L = L::new(34);
    pub const TIMER3A      : L = L::new(35);
    pub const TIMER3B      : L = L::new(36);
    pub const I2C1         : L = L::new(37);
    pub const QEI1         : L = L::new(38);
    pub const CAN0         : L = L::new(39);
    pub const CAN1         : L = L::new(40);
    pub const HIBERNATE    : L = L::new(43);
    pub const USB0         : L = L::new(44);
    pub const PWM0_3       : L = L::new(45);
    pub const UDMA         : L = L::new(46);
    pub const UDMA_ERROR   : L = L::new(47);
    pub const ADC1SS0      : L = L::new(48);
    pub const ADC1SS1      : L = L::new(49);
    pub const ADC1SS2      : L = L::new(50);
    pub const ADC1SS3      : L = L::new(51);
    pub const SSI2         : L = L::new(57);
    pub const SSI3         : L = L::new(58);
    pub const UART3        : L = L::new(59);
    pub const UART4        : L = L::new(60);
    pub const UART5        : L = L::new(61);
    pub const UART6        : L = L::new(62);
    pub const UART7        : L = L::new(63);
    pub const I2C2         : L = L::new(68);
    pub const I2C3         : L = L::new(69);
    pub const TIMER4A      : L = L::new(70);
    pub const TIMER4B      : L = L::new(71);
    pub const TIMER5A      : L = L::new(92);
    pub const TIMER5B      : L = L::new(93);
    pub const WTIMER0A     : L = L::new(94);
    pub const WTIMER0B     : L = L::new(95);
    pub const WTIMER1A     : L = L::new(96);
    pub const WTIMER1B     : L = L::new(97);
    pub const WTIMER2A     : L = L::new(98);
    pub const WTIMER2B     : L = L::new(99);
    pub const WTIMER3A     : L = L::new(100);
    pub const WTIMER3B     : L = L::new(101);
    pub const WTIMER4A     : L = L::new(102);
    pub const WTIMER4B     : L = L::new(103);
    pub const WTIMER5A     : L = L::new(104);
    pub const WTIMER5B     : L = L::new(105);
    pub const SYSEXC       : L = L::new(106);
    pub const PWM1_0       : L = L::new(134);
    pub const PWM1_1       : L = L::new(135);
    pub const PWM1_2       : L = L::new(136);
    pub const PWM1_3       : L = L::new(137);
    pub const PWM1_FAULT   : L = L::new(138);
}
