fn main() {
    energy_invoice_cli::run();
}
