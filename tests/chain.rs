mod common;

use coderchain::nop::NopCoder;
use coderchain::{
    code_buffer, simple_coder_init, Action, Chain, Coder, Error, FilterOptions,
    InBuf, OutBuf, Status,
};
use common::{get_test_data, init_logger, CallMarker, PosXor};

fn encoder_chain(options: FilterOptions) -> Box<dyn Coder> {
    Chain::new()
        .filter(CallMarker, 4, true, options)
        .filter(PosXor, 8, true, options)
        .last(Box::new(NopCoder::new()))
        .build()
        .unwrap()
}

fn decoder_chain(options: FilterOptions) -> Box<dyn Coder> {
    Chain::new()
        .filter(PosXor, 8, false, options)
        .filter(CallMarker, 4, false, options)
        .build()
        .unwrap()
}

fn round_trip(input: &[u8]) {
    for chunk_size in [1, 2, 5, 64, 1 << 16] {
        let mut encoder = encoder_chain(FilterOptions::new());
        let encoded = code_buffer(encoder.as_mut(), input, chunk_size).unwrap();
        assert_eq!(encoded.len(), input.len());

        let options = FilterOptions::with_uncompressed_size(input.len() as u64);
        let mut decoder = decoder_chain(options);
        let decoded = code_buffer(decoder.as_mut(), &encoded, chunk_size);
        assert_eq!(decoded.unwrap(), input);
        decoder.end();
    }
}

#[test]
fn test_chain_round_trip() {
    init_logger();
    round_trip(&[]);
    round_trip(&[0xE8]);
    round_trip(&[0xE8, 0xE8, 0xE8, 0xE8, 0xE8, 0xE8]);
    round_trip(&get_test_data(100));
    round_trip(&get_test_data(10_000));
}

#[test]
fn test_chain_matches_manual_nesting() {
    let input = get_test_data(3000);
    let options = FilterOptions::new();

    let inner = simple_coder_init(None, PosXor, 8, true, &options).unwrap();
    let mut outer =
        simple_coder_init(Some(inner), CallMarker, 4, true, &options).unwrap();
    let expected = code_buffer(outer.as_mut(), &input, 17).unwrap();

    let mut chain = encoder_chain(options);
    let actual = code_buffer(chain.as_mut(), &input, 33).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn test_chain_builder() {
    let chain = Chain::new();
    assert!(chain.is_empty());
    assert!(matches!(chain.build().err(), Some(Error::Program(_))));

    let chain = Chain::new()
        .filter(PosXor, 0, true, FilterOptions::new())
        .last(Box::new(NopCoder::new()));
    assert_eq!(chain.len(), 2);
    assert!(chain.build().is_ok());
}

#[test]
fn test_chain_size_overrun() {
    let input = get_test_data(50);
    let options = FilterOptions::with_uncompressed_size(40);
    let mut decoder = decoder_chain(options);
    let res = code_buffer(decoder.as_mut(), &input, 7);
    assert!(matches!(res, Err(Error::Data(_))));
}

#[test]
fn test_nested_drain_after_full_output() {
    let input = get_test_data(8);
    let options = FilterOptions::new();
    let inner = simple_coder_init(None, PosXor, 4, true, &options).unwrap();
    let mut outer =
        simple_coder_init(Some(inner), PosXor, 8, true, &options).unwrap();

    // The input moves into the inner stage, but there is no room for output.
    let mut inbuf = InBuf::new(&input);
    let mut out = [0u8; 0];
    let res = outer.code(&mut inbuf, &mut OutBuf::new(&mut out), Action::Run);
    assert_eq!(res, Ok(Status::NeedOutput));
    assert_eq!(inbuf.pos(), 8);

    // The inner stage still holds the filtered bytes.
    let mut out = [0u8; 64];
    let mut outbuf = OutBuf::new(&mut out);
    let res = outer.code(&mut InBuf::new(&[]), &mut outbuf, Action::Run);
    assert_eq!(res, Ok(Status::NeedInput));
    assert_eq!(outbuf.pos(), 8);
    let drained = outbuf.written().to_vec();

    let mut outbuf = OutBuf::new(&mut out);
    let res = outer.code(&mut InBuf::new(&[]), &mut outbuf, Action::Finish);
    assert_eq!(res, Ok(Status::StreamEnd));
    assert_eq!(outbuf.pos(), 0);

    let mut reference = encoder_pair(&options);
    let expected = code_buffer(reference.as_mut(), &input, 64).unwrap();
    assert_eq!(drained, expected);
}

fn encoder_pair(options: &FilterOptions) -> Box<dyn Coder> {
    let inner = simple_coder_init(None, PosXor, 4, true, options).unwrap();
    simple_coder_init(Some(inner), PosXor, 8, true, options).unwrap()
}
