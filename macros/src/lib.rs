use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn};

/// Marks a test of the observable crate.
///
/// Sync tests become plain `#[test]` functions. Async tests run on a
/// current-thread tokio runtime inside a `LocalSet`, so `!Send` tasks spawned
/// by the tokio scheduler can be driven. Both install a `tracing` test writer
/// before the body runs.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let raw_args = proc_macro2::TokenStream::from(attr);
  if !raw_args.is_empty() {
    return TokenStream::from(
      syn::Error::new(
        raw_args.span(),
        "es_observable_macro::test takes no arguments. Use #[es_observable_macro::test] on a \
         sync or async fn.",
      )
      .to_compile_error(),
    );
  }

  let ItemFn { attrs, vis, sig, block } = parse_macro_input!(item as ItemFn);
  let init_tracing = quote! {
    let _ = ::tracing_subscriber::fmt().with_test_writer().try_init();
  };

  let expanded = if sig.asyncness.is_some() {
    quote! {
      #(#attrs)*
      #[::tokio::test(flavor = "current_thread")]
      #vis #sig {
        #init_tracing
        ::tokio::task::LocalSet::new().run_until(async move #block).await
      }
    }
  } else {
    quote! {
      #(#attrs)*
      #[test]
      #vis #sig {
        #init_tracing
        #block
      }
    }
  };

  TokenStream::from(expanded)
}
